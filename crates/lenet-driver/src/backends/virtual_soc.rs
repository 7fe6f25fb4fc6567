//! Virtual SoC
//!
//! A host-side model of the board: DDR, DMem, the DMA engine, the conv
//! accelerator and the two performance counters, all behind the same
//! register contract the bare-metal program uses.
//!
//! ## Device timing
//!
//! A job is latched from the parameter registers when `START` is written and
//! its full modeled cost is charged to the cycle counter at that point. The
//! device then reports busy for `cost / cycles_per_poll` status reads and
//! performs the transfer or computation on the read that first reports
//! `DONE`. Before the first job a device reads `IDLE`; after completion it
//! reads `DONE | IDLE` until the next `START`.
//!
//! ```text
//!   START ──▶ busy (STATUS = 0) × N polls ──▶ execute ──▶ STATUS = DONE | IDLE
//! ```
//!
//! Unmapped register reads return 0 and unmapped writes are dropped.

use crate::accel::AcceleratorJob;
use crate::bus::{Platform, RegisterBus};
use crate::config::SocConfig;
use crate::dma::{DmaDirection, DmaJob};
use crate::error::Result;
use crate::memory::{ExternalMemory, LocalMemory, LocalRegion};
use lenet_soc::regs::{self, status, START};
use tracing::{debug, trace, warn};

use super::conv_engine;

/// Job state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceState<J> {
    /// No job submitted since power-on.
    Idle,
    /// Job in flight; `polls` busy status reads remain.
    Busy { job: J, polls: u64 },
    /// Last job completed.
    Done,
}

impl<J> DeviceState<J> {
    const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Activity counters of the virtual SoC, independent of the MMIO counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocStats {
    /// DMA jobs completed
    pub dma_jobs: u64,
    /// Words moved by the DMA engine
    pub dma_words: u64,
    /// Accelerator jobs completed
    pub accel_jobs: u64,
    /// Multiply-accumulates performed by the accelerator
    pub accel_macs: u64,
    /// MMIO loads
    pub bus_reads: u64,
    /// MMIO stores
    pub bus_writes: u64,
    /// Status register reads (both devices)
    pub status_polls: u64,
}

#[derive(Debug, Default)]
struct DmaRegs {
    dir: u32,
    src: u32,
    dst: u32,
    len: u32,
}

#[derive(Debug, Default)]
struct XcelRegs {
    ifm_addr: u32,
    wt_addr: u32,
    ofm_addr: u32,
    ifm_dim: u32,
    ifm_depth: u32,
    ofm_dim: u32,
    ofm_depth: u32,
}

/// Simulated SoC implementing [`RegisterBus`] and [`Platform`].
#[derive(Debug)]
pub struct VirtualSoc {
    config: SocConfig,
    ddr: ExternalMemory,
    dmem: LocalMemory,

    dma_regs: DmaRegs,
    dma: DeviceState<DmaJob>,
    xcel_regs: XcelRegs,
    xcel: DeviceState<AcceleratorJob>,

    cycles: u64,
    instructions: u64,
    stats: SocStats,
}

impl VirtualSoc {
    /// Build a SoC with zeroed memories and counters.
    ///
    /// # Errors
    ///
    /// Returns error if `config` fails [`SocConfig::validate`].
    pub fn new(config: SocConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Virtual SoC: DDR {} bytes, DMem {} words, {:?}",
            config.external_bytes, config.local_words, config.cost
        );
        Ok(Self {
            ddr: ExternalMemory::new(config.external_bytes),
            dmem: LocalMemory::new(config.local_words),
            config,
            dma_regs: DmaRegs::default(),
            dma: DeviceState::Idle,
            xcel_regs: XcelRegs::default(),
            xcel: DeviceState::Idle,
            cycles: 0,
            instructions: 0,
            stats: SocStats::default(),
        })
    }

    /// Configuration the SoC was built with.
    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    /// External memory, for host-side staging.
    pub fn ddr(&self) -> &ExternalMemory {
        &self.ddr
    }

    /// Mutable external memory, for host-side staging.
    pub fn ddr_mut(&mut self) -> &mut ExternalMemory {
        &mut self.ddr
    }

    /// Activity counters.
    pub fn stats(&self) -> SocStats {
        self.stats
    }

    /// Full-width cycle count since the last counter reset.
    pub fn cycles_wide(&self) -> u64 {
        self.cycles
    }

    /// Full-width instruction count since the last counter reset.
    pub fn instructions_wide(&self) -> u64 {
        self.instructions
    }

    fn bus_access(&mut self) {
        self.cycles += self.config.cost.bus_access;
        self.instructions += 1;
    }

    fn start_dma(&mut self) {
        if self.dma.is_busy() {
            warn!("DMA_START while a transfer is in flight, ignored");
            return;
        }
        let job = DmaJob {
            direction: DmaDirection::from_register(self.dma_regs.dir),
            src: self.dma_regs.src,
            dst: self.dma_regs.dst,
            words: self.dma_regs.len,
        };
        let cost = self.config.cost.dma_cycles(job.words as usize);
        self.cycles += cost;
        self.dma = DeviceState::Busy {
            job,
            polls: self.config.cost.busy_polls(cost),
        };
    }

    fn start_xcel(&mut self) {
        if self.xcel.is_busy() {
            warn!("XCEL_START while a job is in flight, ignored");
            return;
        }
        let r = &self.xcel_regs;
        let job = AcceleratorJob {
            ifm_addr: r.ifm_addr,
            wt_addr: r.wt_addr,
            ofm_addr: r.ofm_addr,
            ifm_dim: r.ifm_dim,
            ifm_depth: r.ifm_depth,
            ofm_dim: r.ofm_dim,
            ofm_depth: r.ofm_depth,
        };
        let cost = self.config.cost.accel_cycles(job.macs());
        self.cycles += cost;
        self.xcel = DeviceState::Busy {
            job,
            polls: self.config.cost.busy_polls(cost),
        };
    }

    fn poll_dma(&mut self) -> u32 {
        self.stats.status_polls += 1;
        match &mut self.dma {
            DeviceState::Idle => status::IDLE,
            DeviceState::Done => status::DONE | status::IDLE,
            DeviceState::Busy { polls, .. } if *polls > 0 => {
                *polls -= 1;
                0
            }
            DeviceState::Busy { job, .. } => {
                let job = *job;
                self.execute_dma(&job);
                self.dma = DeviceState::Done;
                status::DONE | status::IDLE
            }
        }
    }

    fn poll_xcel(&mut self) -> u32 {
        self.stats.status_polls += 1;
        match &mut self.xcel {
            DeviceState::Idle => status::IDLE,
            DeviceState::Done => status::DONE | status::IDLE,
            DeviceState::Busy { polls, .. } if *polls > 0 => {
                *polls -= 1;
                0
            }
            DeviceState::Busy { job, .. } => {
                let job = *job;
                conv_engine::execute(&mut self.ddr, &job);
                self.stats.accel_jobs += 1;
                self.stats.accel_macs += job.macs();
                self.xcel = DeviceState::Done;
                status::DONE | status::IDLE
            }
        }
    }

    /// Move the words of `job` between DDR and DMem.
    ///
    /// # Panics
    ///
    /// Panics if either side of the transfer lies outside its memory.
    fn execute_dma(&mut self, job: &DmaJob) {
        let words = job.words as usize;
        match job.direction {
            DmaDirection::DdrToDmem => {
                let region = LocalRegion::new(job.dst, words);
                self.dmem
                    .check(region)
                    .unwrap_or_else(|e| panic!("DMA destination: {e}"));
                let src = self
                    .ddr
                    .slice(job.src, region.bytes())
                    .unwrap_or_else(|e| panic!("DMA source: {e}"));
                for (w, b) in self.dmem.words_mut(region).iter_mut().zip(src.chunks_exact(4)) {
                    *w = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
                }
            }
            DmaDirection::DmemToDdr => {
                let region = LocalRegion::new(job.src, words);
                self.dmem
                    .check(region)
                    .unwrap_or_else(|e| panic!("DMA source: {e}"));
                let dst = self
                    .ddr
                    .slice_mut(job.dst, region.bytes())
                    .unwrap_or_else(|e| panic!("DMA destination: {e}"));
                dst.copy_from_slice(self.dmem.bytes(region));
            }
        }
        self.stats.dma_jobs += 1;
        self.stats.dma_words += words as u64;
    }
}

impl RegisterBus for VirtualSoc {
    #[allow(clippy::cast_possible_truncation)]
    fn read32(&mut self, addr: u32) -> u32 {
        self.bus_access();
        self.stats.bus_reads += 1;
        let value = match addr {
            regs::CYCLE_COUNTER => self.cycles as u32,
            regs::INSTRUCTION_COUNTER => self.instructions as u32,
            regs::DMA_STATUS => self.poll_dma(),
            regs::XCEL_STATUS => self.poll_xcel(),
            regs::DMA_DIR => self.dma_regs.dir,
            regs::DMA_SRC_ADDR => self.dma_regs.src,
            regs::DMA_DST_ADDR => self.dma_regs.dst,
            regs::DMA_LEN => self.dma_regs.len,
            regs::XCEL_IFM_DDR_ADDR => self.xcel_regs.ifm_addr,
            regs::XCEL_WT_DDR_ADDR => self.xcel_regs.wt_addr,
            regs::XCEL_OFM_DDR_ADDR => self.xcel_regs.ofm_addr,
            regs::XCEL_IFM_DIM => self.xcel_regs.ifm_dim,
            regs::XCEL_IFM_DEPTH => self.xcel_regs.ifm_depth,
            regs::XCEL_OFM_DIM => self.xcel_regs.ofm_dim,
            regs::XCEL_OFM_DEPTH => self.xcel_regs.ofm_depth,
            _ => {
                trace!("read of unmapped register {:#010x}", addr);
                return 0;
            }
        };
        trace!(
            "read  {:<20} = {:#010x}",
            regs::name(addr).unwrap_or("?"),
            value
        );
        value
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.bus_access();
        self.stats.bus_writes += 1;
        trace!(
            "write {:<20} = {:#010x}",
            regs::name(addr).unwrap_or("?"),
            value
        );
        match addr {
            regs::COUNTER_RST => {
                self.cycles = 0;
                self.instructions = 0;
            }
            regs::DMA_START if value & START != 0 => self.start_dma(),
            regs::DMA_DIR => self.dma_regs.dir = value,
            regs::DMA_SRC_ADDR => self.dma_regs.src = value,
            regs::DMA_DST_ADDR => self.dma_regs.dst = value,
            regs::DMA_LEN => self.dma_regs.len = value,
            regs::XCEL_START if value & START != 0 => self.start_xcel(),
            regs::XCEL_IFM_DDR_ADDR => self.xcel_regs.ifm_addr = value,
            regs::XCEL_WT_DDR_ADDR => self.xcel_regs.wt_addr = value,
            regs::XCEL_OFM_DDR_ADDR => self.xcel_regs.ofm_addr = value,
            regs::XCEL_IFM_DIM => self.xcel_regs.ifm_dim = value,
            regs::XCEL_IFM_DEPTH => self.xcel_regs.ifm_depth = value,
            regs::XCEL_OFM_DIM => self.xcel_regs.ofm_dim = value,
            regs::XCEL_OFM_DEPTH => self.xcel_regs.ofm_depth = value,
            _ => trace!("write to unmapped register {:#010x} dropped", addr),
        }
    }
}

impl Platform for VirtualSoc {
    fn local(&self) -> &LocalMemory {
        &self.dmem
    }

    fn local_mut(&mut self) -> &mut LocalMemory {
        &mut self.dmem
    }

    fn retire(&mut self, ops: u64) {
        self.cycles += ops * self.config.cost.sw_op;
        self.instructions += ops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostModel;

    fn soc() -> VirtualSoc {
        VirtualSoc::new(SocConfig::default()).unwrap()
    }

    #[test]
    fn status_idle_before_first_job() {
        let mut soc = soc();
        assert_eq!(soc.read32(regs::DMA_STATUS), status::IDLE);
        assert_eq!(soc.read32(regs::XCEL_STATUS), status::IDLE);
    }

    #[test]
    fn dma_busy_for_cost_over_poll_interval() {
        let mut soc = soc();
        soc.write32(regs::DMA_LEN, 64);
        soc.write32(regs::DMA_START, START);
        // 64 words × 1 cycle / 16 cycles per poll
        for _ in 0..4 {
            assert_eq!(soc.read32(regs::DMA_STATUS), 0);
        }
        assert_eq!(soc.read32(regs::DMA_STATUS), status::DONE | status::IDLE);
        assert_eq!(soc.read32(regs::DMA_STATUS), status::DONE | status::IDLE);
        assert_eq!(soc.stats().dma_jobs, 1);
    }

    #[test]
    fn start_while_busy_is_ignored() {
        let mut soc = soc();
        soc.write32(regs::DMA_LEN, 32);
        soc.write32(regs::DMA_START, START);
        soc.write32(regs::DMA_LEN, 3200);
        soc.write32(regs::DMA_START, START);
        let mut polls = 0;
        while soc.read32(regs::DMA_STATUS) & status::DONE == 0 {
            polls += 1;
        }
        assert_eq!(polls, 2);
        assert_eq!(soc.stats().dma_words, 32);
    }

    #[test]
    fn unmapped_registers() {
        let mut soc = soc();
        soc.write32(0x8000_0100, 0xdead_beef);
        assert_eq!(soc.read32(0x8000_0100), 0);
        assert_eq!(soc.stats().bus_writes, 1);
        assert_eq!(soc.stats().bus_reads, 1);
    }

    #[test]
    fn counters_follow_cost_model() {
        let cost = CostModel {
            bus_access: 2,
            sw_op: 5,
            ..CostModel::default()
        };
        let mut soc = VirtualSoc::new(SocConfig::default().with_cost(cost)).unwrap();
        soc.write32(regs::COUNTER_RST, 0);
        soc.retire(10);
        // reading CYCLE_COUNTER counts itself before sampling
        assert_eq!(soc.read32(regs::CYCLE_COUNTER), 50 + 2);
        assert_eq!(soc.read32(regs::INSTRUCTION_COUNTER), 10 + 2);
    }

    #[test]
    fn parameter_registers_read_back() {
        let mut soc = soc();
        soc.write32(regs::XCEL_IFM_DIM, 28);
        soc.write32(regs::DMA_SRC_ADDR, 0x1234);
        assert_eq!(soc.read32(regs::XCEL_IFM_DIM), 28);
        assert_eq!(soc.read32(regs::DMA_SRC_ADDR), 0x1234);
    }

    #[test]
    #[should_panic(expected = "DMA destination")]
    fn dma_outside_dmem_panics() {
        let mut soc = soc();
        soc.write32(regs::DMA_DIR, regs::dma_dir::DDR_TO_DMEM);
        soc.write32(regs::DMA_DST_ADDR, 16 * 1024 - 1);
        soc.write32(regs::DMA_LEN, 2);
        soc.write32(regs::DMA_START, START);
        while soc.read32(regs::DMA_STATUS) & status::DONE == 0 {}
    }
}
