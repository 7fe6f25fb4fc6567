//! MMIO register map.
//!
//! Every register is a 32-bit word in the `0x8000_0000` I/O region. The
//! counter block matches the base memory map of the core; the accelerator
//! and DMA blocks follow the same `START` / `STATUS` / parameters pattern as
//! the earlier CONV2D block at `0x8000_0040`.
//!
//! ```text
//! 0x80000010  CYCLE_COUNTER        free-running, read-only
//! 0x80000014  INSTRUCTION_COUNTER  free-running, read-only
//! 0x80000018  COUNTER_RST          write any value to zero both counters
//!
//! 0x80000040  XCEL_START           write 1
//! 0x80000044  XCEL_STATUS          bit 0 done, bit 1 idle
//! 0x80000048  XCEL_IFM_DDR_ADDR
//! 0x8000004c  XCEL_WT_DDR_ADDR
//! 0x80000050  XCEL_OFM_DDR_ADDR
//! 0x80000054  XCEL_IFM_DIM
//! 0x80000058  XCEL_IFM_DEPTH
//! 0x8000005c  XCEL_OFM_DIM
//! 0x80000060  XCEL_OFM_DEPTH
//!
//! 0x80000080  DMA_START            write 1
//! 0x80000084  DMA_STATUS           bit 0 done, bit 1 idle
//! 0x80000088  DMA_DIR              0 = DDR -> DMem, 1 = DMem -> DDR
//! 0x8000008c  DMA_SRC_ADDR
//! 0x80000090  DMA_DST_ADDR
//! 0x80000094  DMA_LEN              32-bit words
//! ```
//!
//! DDR addresses are byte addresses. DMem addresses handed to the DMA are
//! word addresses (`ptr >> 2`).

/// Base of the memory-mapped I/O region.
pub const MMIO_BASE: u32 = 0x8000_0000;

// ── Performance counters ─────────────────────────────────────────────────────

/// Free-running cycle counter.
pub const CYCLE_COUNTER: u32 = 0x8000_0010;
/// Free-running retired-instruction counter.
pub const INSTRUCTION_COUNTER: u32 = 0x8000_0014;
/// Counter reset. Any write zeroes both counters.
pub const COUNTER_RST: u32 = 0x8000_0018;

// ── Conv3D accelerator ───────────────────────────────────────────────────────

/// Accelerator register block base.
pub const XCEL_BASE: u32 = 0x8000_0040;
/// Start trigger (write 1).
pub const XCEL_START: u32 = XCEL_BASE;
/// Status word, see [`status`].
pub const XCEL_STATUS: u32 = XCEL_BASE + 0x04;
/// Input feature map DDR byte address.
pub const XCEL_IFM_DDR_ADDR: u32 = XCEL_BASE + 0x08;
/// Weight DDR byte address.
pub const XCEL_WT_DDR_ADDR: u32 = XCEL_BASE + 0x0C;
/// Output feature map DDR byte address.
pub const XCEL_OFM_DDR_ADDR: u32 = XCEL_BASE + 0x10;
/// Input spatial dimension (square).
pub const XCEL_IFM_DIM: u32 = XCEL_BASE + 0x14;
/// Input depth.
pub const XCEL_IFM_DEPTH: u32 = XCEL_BASE + 0x18;
/// Output spatial dimension (square).
pub const XCEL_OFM_DIM: u32 = XCEL_BASE + 0x1C;
/// Output depth.
pub const XCEL_OFM_DEPTH: u32 = XCEL_BASE + 0x20;

// ── DMA engine ───────────────────────────────────────────────────────────────

/// DMA register block base.
pub const DMA_BASE: u32 = 0x8000_0080;
/// Start trigger (write 1).
pub const DMA_START: u32 = DMA_BASE;
/// Status word, see [`status`].
pub const DMA_STATUS: u32 = DMA_BASE + 0x04;
/// Transfer direction, see [`dma_dir`].
pub const DMA_DIR: u32 = DMA_BASE + 0x08;
/// Source address (DDR byte address or DMem word address).
pub const DMA_SRC_ADDR: u32 = DMA_BASE + 0x0C;
/// Destination address (DDR byte address or DMem word address).
pub const DMA_DST_ADDR: u32 = DMA_BASE + 0x10;
/// Transfer length in 32-bit words.
pub const DMA_LEN: u32 = DMA_BASE + 0x14;

/// Value written to a `*_START` register to launch a job.
pub const START: u32 = 1;

// ── Status register bit definitions (DMA and accelerator) ────────────────────

pub mod status {
    /// Last job has completed.
    pub const DONE: u32 = 1 << 0;
    /// Device is not processing a job.
    pub const IDLE: u32 = 1 << 1;
}

// ── DMA direction values ─────────────────────────────────────────────────────

pub mod dma_dir {
    /// External DDR to local DMem.
    pub const DDR_TO_DMEM: u32 = 0;
    /// Local DMem to external DDR.
    pub const DMEM_TO_DDR: u32 = 1;
}

/// Human-readable name of a register, for tracing and `lenet regs`.
#[must_use]
pub const fn name(addr: u32) -> Option<&'static str> {
    Some(match addr {
        CYCLE_COUNTER => "CYCLE_COUNTER",
        INSTRUCTION_COUNTER => "INSTRUCTION_COUNTER",
        COUNTER_RST => "COUNTER_RST",
        XCEL_START => "XCEL_START",
        XCEL_STATUS => "XCEL_STATUS",
        XCEL_IFM_DDR_ADDR => "XCEL_IFM_DDR_ADDR",
        XCEL_WT_DDR_ADDR => "XCEL_WT_DDR_ADDR",
        XCEL_OFM_DDR_ADDR => "XCEL_OFM_DDR_ADDR",
        XCEL_IFM_DIM => "XCEL_IFM_DIM",
        XCEL_IFM_DEPTH => "XCEL_IFM_DEPTH",
        XCEL_OFM_DIM => "XCEL_OFM_DIM",
        XCEL_OFM_DEPTH => "XCEL_OFM_DEPTH",
        DMA_START => "DMA_START",
        DMA_STATUS => "DMA_STATUS",
        DMA_DIR => "DMA_DIR",
        DMA_SRC_ADDR => "DMA_SRC_ADDR",
        DMA_DST_ADDR => "DMA_DST_ADDR",
        DMA_LEN => "DMA_LEN",
        _ => return None,
    })
}

/// Every named register, in address order.
pub const ALL: [u32; 18] = [
    CYCLE_COUNTER,
    INSTRUCTION_COUNTER,
    COUNTER_RST,
    XCEL_START,
    XCEL_STATUS,
    XCEL_IFM_DDR_ADDR,
    XCEL_WT_DDR_ADDR,
    XCEL_OFM_DDR_ADDR,
    XCEL_IFM_DIM,
    XCEL_IFM_DEPTH,
    XCEL_OFM_DIM,
    XCEL_OFM_DEPTH,
    DMA_START,
    DMA_STATUS,
    DMA_DIR,
    DMA_SRC_ADDR,
    DMA_DST_ADDR,
    DMA_LEN,
];
