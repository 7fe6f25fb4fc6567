//! Register bus and platform abstraction
//!
//! The core talks to its peripherals through 32-bit loads and stores in the
//! MMIO region. [`RegisterBus`] is that seam; [`Platform`] adds the local
//! scratch memory the DMA engine writes into, so the inference pipeline can
//! be written once against any target that implements the register contract.

use crate::memory::LocalMemory;
use std::fmt::Debug;

/// 32-bit memory-mapped register access.
///
/// Reads take `&mut self`: status reads are observed by the device (a poll is
/// an event), and exclusive access is what keeps a single job in flight per
/// device.
pub trait RegisterBus: Debug {
    /// Load a 32-bit register.
    fn read32(&mut self, addr: u32) -> u32;

    /// Store a 32-bit register.
    fn write32(&mut self, addr: u32, value: u32);
}

/// A complete target: register bus plus the core's local data memory.
pub trait Platform: RegisterBus {
    /// Local scratch memory (DMem).
    fn local(&self) -> &LocalMemory;

    /// Mutable local scratch memory (DMem).
    fn local_mut(&mut self) -> &mut LocalMemory;

    /// Account for `ops` software operations executed by the core.
    ///
    /// Real silicon counts retired instructions by itself, so the default is
    /// a no-op. Simulated targets use it to advance their counters.
    fn retire(&mut self, ops: u64) {
        let _ = ops;
    }
}
