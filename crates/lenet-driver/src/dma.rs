//! DMA block transfers
//!
//! One job at a time: program direction, source, destination and length,
//! write `START`, then spin on `DMA_STATUS` until `DONE` is set.
//!
//! ```text
//! direction      source                destination
//! ────────────── ───────────────────── ─────────────────────
//! DdrToDmem      DDR byte address      DMem word address
//! DmemToDdr      DMem word address     DDR byte address
//! ```
//!
//! There is no timeout. A DMA engine that never raises `DONE` stalls the
//! caller, which matches the bare-metal program.

use crate::bus::{Platform, RegisterBus};
use crate::error::Result;
use crate::memory::LocalRegion;
use lenet_soc::regs::{
    dma_dir, status, DMA_DIR, DMA_DST_ADDR, DMA_LEN, DMA_SRC_ADDR, DMA_START, DMA_STATUS, START,
};
use tracing::debug;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaDirection {
    /// External DDR to local DMem (load).
    DdrToDmem,
    /// Local DMem to external DDR (store).
    DmemToDdr,
}

impl DmaDirection {
    /// Value of the `DMA_DIR` register.
    pub const fn register_value(self) -> u32 {
        match self {
            Self::DdrToDmem => dma_dir::DDR_TO_DMEM,
            Self::DmemToDdr => dma_dir::DMEM_TO_DDR,
        }
    }

    /// Decode a `DMA_DIR` value. Any non-zero value is a store.
    pub const fn from_register(value: u32) -> Self {
        if value == dma_dir::DDR_TO_DMEM {
            Self::DdrToDmem
        } else {
            Self::DmemToDdr
        }
    }
}

/// A single DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaJob {
    /// Transfer direction
    pub direction: DmaDirection,
    /// Source address (units depend on direction)
    pub src: u32,
    /// Destination address (units depend on direction)
    pub dst: u32,
    /// Length in 32-bit words
    pub words: u32,
}

impl DmaJob {
    /// Load `words` words from DDR byte address `ddr_addr` into DMem word
    /// address `dmem_word`.
    pub const fn load(ddr_addr: u32, dmem_word: u32, words: u32) -> Self {
        Self {
            direction: DmaDirection::DdrToDmem,
            src: ddr_addr,
            dst: dmem_word,
            words,
        }
    }

    /// Store `words` words from DMem word address `dmem_word` to DDR byte
    /// address `ddr_addr`.
    pub const fn store(dmem_word: u32, ddr_addr: u32, words: u32) -> Self {
        Self {
            direction: DmaDirection::DmemToDdr,
            src: dmem_word,
            dst: ddr_addr,
            words,
        }
    }
}

/// Submit `job` and wait for completion. Returns the number of status polls
/// that saw the engine busy.
pub fn transfer<B: RegisterBus + ?Sized>(bus: &mut B, job: DmaJob) -> u64 {
    bus.write32(DMA_DIR, job.direction.register_value());
    bus.write32(DMA_SRC_ADDR, job.src);
    bus.write32(DMA_DST_ADDR, job.dst);
    bus.write32(DMA_LEN, job.words);
    bus.write32(DMA_START, START);

    let mut polls = 0u64;
    while bus.read32(DMA_STATUS) & status::DONE == 0 {
        polls += 1;
        std::hint::spin_loop();
    }

    debug!(
        "DMA {:?} src={:#x} dst={:#x} words={} done after {} busy polls",
        job.direction, job.src, job.dst, job.words, polls
    );
    polls
}

/// Load `words` words from DDR into DMem.
pub fn load_block<B: RegisterBus + ?Sized>(bus: &mut B, ddr_addr: u32, dmem_word: u32, words: u32) {
    transfer(bus, DmaJob::load(ddr_addr, dmem_word, words));
}

/// Store `words` words from DMem to DDR.
pub fn store_block<B: RegisterBus + ?Sized>(bus: &mut B, dmem_word: u32, ddr_addr: u32, words: u32) {
    transfer(bus, DmaJob::store(dmem_word, ddr_addr, words));
}

/// Loop `words` words from DMem out to DDR at `ddr_addr` and back into a
/// second DMem buffer, then compare byte by byte. Returns the number of
/// mismatched bytes.
///
/// The source buffer sits at DMem word 0 and is filled with a counting
/// pattern; the destination follows it.
///
/// # Errors
///
/// Returns error if DMem cannot hold both buffers.
pub fn loopback<P: Platform + ?Sized>(platform: &mut P, words: u32, ddr_addr: u32) -> Result<usize> {
    let src = LocalRegion::new(0, words as usize);
    let dst = LocalRegion::new(words, words as usize);
    platform.local().check(dst)?;

    for (i, b) in platform.local_mut().bytes_mut(src).iter_mut().enumerate() {
        *b = i as u8;
    }
    platform.local_mut().bytes_mut(dst).fill(0);

    store_block(platform, src.addr, ddr_addr, words);
    load_block(platform, ddr_addr, dst.addr, words);

    let local = platform.local();
    let mismatches = local
        .bytes(src)
        .iter()
        .zip(local.bytes(dst))
        .filter(|(a, b)| a != b)
        .count();
    debug!("DMA loopback of {} words: {} mismatches", words, mismatches);
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every access and reports busy for a fixed number of polls.
    #[derive(Debug, Default)]
    struct ScriptedBus {
        writes: Vec<(u32, u32)>,
        busy_polls: u64,
        polls: u64,
    }

    impl RegisterBus for ScriptedBus {
        fn read32(&mut self, addr: u32) -> u32 {
            assert_eq!(addr, DMA_STATUS);
            self.polls += 1;
            if self.polls > self.busy_polls {
                status::DONE | status::IDLE
            } else {
                0
            }
        }

        fn write32(&mut self, addr: u32, value: u32) {
            self.writes.push((addr, value));
        }
    }

    #[test]
    fn load_programs_registers_in_order() {
        let mut bus = ScriptedBus::default();
        load_block(&mut bus, 0x0010_b4b4, 0x40, 196);
        assert_eq!(
            bus.writes,
            vec![
                (DMA_DIR, dma_dir::DDR_TO_DMEM),
                (DMA_SRC_ADDR, 0x0010_b4b4),
                (DMA_DST_ADDR, 0x40),
                (DMA_LEN, 196),
                (DMA_START, START),
            ]
        );
    }

    #[test]
    fn store_swaps_source_and_destination() {
        let mut bus = ScriptedBus::default();
        store_block(&mut bus, 0x80, 0x0090_0000, 288);
        assert_eq!(bus.writes[0], (DMA_DIR, dma_dir::DMEM_TO_DDR));
        assert_eq!(bus.writes[1], (DMA_SRC_ADDR, 0x80));
        assert_eq!(bus.writes[2], (DMA_DST_ADDR, 0x0090_0000));
    }

    #[test]
    fn waits_until_done() {
        let mut bus = ScriptedBus {
            busy_polls: 7,
            ..ScriptedBus::default()
        };
        let busy = transfer(&mut bus, DmaJob::load(0, 0, 1));
        assert_eq!(busy, 7);
        assert_eq!(bus.polls, 8);
    }

    #[test]
    fn direction_register_roundtrip() {
        for dir in [DmaDirection::DdrToDmem, DmaDirection::DmemToDdr] {
            assert_eq!(DmaDirection::from_register(dir.register_value()), dir);
        }
    }
}
