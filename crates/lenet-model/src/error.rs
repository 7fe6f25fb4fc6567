//! Error types for LeNet model setup and staging

use lenet_driver::SocError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while loading, staging or laying out a run.
///
/// Classification itself has no error path once the run is set up.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Dataset or weight file not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was attempted
        path: PathBuf,
    },

    /// Blob of the wrong size
    #[error("{what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// What was being loaded
        what: &'static str,
        /// Required size in bytes
        expected: usize,
        /// Size found
        actual: usize,
    },

    /// Local scratch memory too small for the arena
    #[error("Arena exhausted: {requested} words requested, {available} available")]
    ArenaExhausted {
        /// Words requested by the allocation
        requested: usize,
        /// Words left in DMem
        available: usize,
    },

    /// Invalid run configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for rejection
        reason: String,
    },

    /// SoC setup or staging failure
    #[error("SoC: {source}")]
    Soc {
        /// Underlying SoC error
        #[from]
        source: SocError,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl ModelError {
    /// Create a size mismatch error
    pub fn size_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
