//! Virtual SoC configuration
//!
//! The cycle counter of the virtual SoC is driven by a fixed cost model, so
//! two runs of the same program report the same numbers. Costs are in cycles.
//!
//! ```text
//! event                           cycles                 instructions
//! ─────────────────────────────── ────────────────────── ────────────
//! MMIO load / store               bus_access             1
//! DMA job of N words              N × dma_word           0
//! accelerator job of M MACs       ⌈M / accel_macs⌉       0
//! retired software op             sw_op                  1
//! ```

use crate::error::{Result, SocError};
use lenet_soc::memmap::{DDR_BYTES, MIN_DDR_BYTES};

/// Deterministic cycle cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// Cycles per MMIO register access
    pub bus_access: u64,
    /// Cycles per 32-bit word moved by the DMA engine
    pub dma_word: u64,
    /// Multiply-accumulates the accelerator retires per cycle
    pub accel_macs_per_cycle: u64,
    /// Cycles per software op retired by the core
    pub sw_op: u64,
    /// Device cycles that elapse between two status polls
    pub cycles_per_poll: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            bus_access: 1,
            dma_word: 1,
            accel_macs_per_cycle: 4,
            sw_op: 4,
            cycles_per_poll: 16,
        }
    }
}

impl CostModel {
    /// Cycles a DMA job of `words` words occupies the engine.
    pub fn dma_cycles(&self, words: usize) -> u64 {
        words as u64 * self.dma_word
    }

    /// Cycles an accelerator job of `macs` multiply-accumulates takes.
    pub fn accel_cycles(&self, macs: u64) -> u64 {
        macs.div_ceil(self.accel_macs_per_cycle)
    }

    /// Number of busy status polls a job of `cycles` cycles reports.
    pub fn busy_polls(&self, cycles: u64) -> u64 {
        cycles / self.cycles_per_poll
    }
}

/// Virtual SoC memory sizes and cost model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocConfig {
    /// External memory (DDR) size in bytes
    pub external_bytes: usize,
    /// Local scratch memory (DMem) size in 32-bit words
    pub local_words: usize,
    /// Cycle cost model
    pub cost: CostModel,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            external_bytes: DDR_BYTES,
            local_words: 16 * 1024,
            cost: CostModel::default(),
        }
    }
}

impl SocConfig {
    /// Set the DDR size in bytes.
    #[must_use]
    pub fn with_external_bytes(mut self, bytes: usize) -> Self {
        self.external_bytes = bytes;
        self
    }

    /// Set the DMem size in words.
    #[must_use]
    pub fn with_local_words(mut self, words: usize) -> Self {
        self.local_words = words;
        self
    }

    /// Replace the cost model.
    #[must_use]
    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    /// Check that the configuration describes a usable SoC.
    ///
    /// # Errors
    ///
    /// Returns error if DDR cannot hold the fixed memory layout, DDR does not
    /// fit the 32-bit address space below the MMIO region, DMem is empty, or
    /// a cost divisor is zero.
    pub fn validate(&self) -> Result<()> {
        if self.external_bytes < MIN_DDR_BYTES {
            return Err(SocError::invalid_config(format!(
                "external memory of {} bytes cannot hold the layout (need {MIN_DDR_BYTES})",
                self.external_bytes
            )));
        }
        if self.external_bytes > lenet_soc::regs::MMIO_BASE as usize {
            return Err(SocError::invalid_config(format!(
                "external memory of {} bytes overlaps the MMIO region",
                self.external_bytes
            )));
        }
        if self.local_words == 0 {
            return Err(SocError::invalid_config("local memory is empty"));
        }
        if self.cost.accel_macs_per_cycle == 0 {
            return Err(SocError::invalid_config(
                "accel_macs_per_cycle must be non-zero",
            ));
        }
        if self.cost.cycles_per_poll == 0 {
            return Err(SocError::invalid_config("cycles_per_poll must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SocConfig::default().validate().unwrap();
    }

    #[test]
    fn small_ddr_rejected() {
        let cfg = SocConfig::default().with_external_bytes(1024);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_divisors_rejected() {
        let cost = CostModel {
            cycles_per_poll: 0,
            ..CostModel::default()
        };
        assert!(SocConfig::default().with_cost(cost).validate().is_err());

        let cost = CostModel {
            accel_macs_per_cycle: 0,
            ..CostModel::default()
        };
        assert!(SocConfig::default().with_cost(cost).validate().is_err());
        assert!(SocConfig::default().with_local_words(0).validate().is_err());
    }

    #[test]
    fn cost_helpers() {
        let cost = CostModel::default();
        assert_eq!(cost.dma_cycles(196), 196);
        assert_eq!(cost.accel_cycles(5), 2);
        assert_eq!(cost.busy_polls(33), 2);
    }
}
