//! Error types for SoC setup and staging

use thiserror::Error;

/// Result type alias for SoC operations
pub type Result<T> = std::result::Result<T, SocError>;

/// Errors raised while configuring the SoC or staging memory.
///
/// The job protocol itself has no error path: a device that never raises
/// `DONE` stalls the caller forever, exactly as on the bare-metal target.
#[derive(Debug, Error)]
pub enum SocError {
    /// Access outside external memory
    #[error("DDR access out of bounds: addr={addr:#x} len={len} limit={limit:#x}")]
    ExternalOutOfBounds {
        /// DDR byte address
        addr: u32,
        /// Access length in bytes
        len: usize,
        /// DDR size in bytes
        limit: usize,
    },

    /// Access outside local scratch memory
    #[error("DMem access out of bounds: word={word:#x} words={words} limit={limit:#x}")]
    LocalOutOfBounds {
        /// DMem word address
        word: u32,
        /// Access length in words
        words: usize,
        /// DMem size in words
        limit: usize,
    },

    /// Configuration rejected by validation
    #[error("Invalid SoC configuration: {reason}")]
    InvalidConfig {
        /// Reason for rejection
        reason: String,
    },
}

impl SocError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
