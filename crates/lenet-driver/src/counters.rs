//! Cycle and instruction counters
//!
//! Both counters are free-running and share one reset register. Reading
//! them is itself a bus access, so a measurement includes the two counter
//! loads at its end.

use crate::bus::RegisterBus;
use lenet_soc::regs::{COUNTER_RST, CYCLE_COUNTER, INSTRUCTION_COUNTER};

/// Zero both counters.
pub fn reset<B: RegisterBus + ?Sized>(bus: &mut B) {
    bus.write32(COUNTER_RST, 1);
}

/// Current cycle count.
pub fn cycles<B: RegisterBus + ?Sized>(bus: &mut B) -> u32 {
    bus.read32(CYCLE_COUNTER)
}

/// Current retired-instruction count.
pub fn instructions<B: RegisterBus + ?Sized>(bus: &mut B) -> u32 {
    bus.read32(INSTRUCTION_COUNTER)
}

/// Outcome of [`measure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement<T> {
    /// Value returned by the measured work
    pub result: T,
    /// Cycles elapsed
    pub cycles: u32,
    /// Instructions retired
    pub instructions: u32,
}

/// Reset the counters, run `work`, then sample both counters.
///
/// The result of `work` is passed through unchanged.
pub fn measure<B, T, F>(bus: &mut B, work: F) -> Measurement<T>
where
    B: RegisterBus + ?Sized,
    F: FnOnce(&mut B) -> T,
{
    reset(bus);
    let result = work(bus);
    let cycles = cycles(bus);
    let instructions = instructions(bus);
    Measurement {
        result,
        cycles,
        instructions,
    }
}
