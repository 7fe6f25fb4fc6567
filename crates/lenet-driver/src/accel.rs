//! Conv accelerator job submission
//!
//! The accelerator computes a full 3-D correlation over external memory:
//! i8 input volume and i8 kernels in, raw i32 accumulators out, all in the
//! depth-major layout the software stages use. Rescaling stays on the core.
//!
//! The kernel edge is implied: `ifm_dim - ofm_dim + 1`.

use crate::bus::RegisterBus;
use lenet_soc::regs::{
    status, START, XCEL_IFM_DDR_ADDR, XCEL_IFM_DEPTH, XCEL_IFM_DIM, XCEL_OFM_DDR_ADDR,
    XCEL_OFM_DEPTH, XCEL_OFM_DIM, XCEL_START, XCEL_STATUS, XCEL_WT_DDR_ADDR,
};
use tracing::debug;

/// One convolution layer for the accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratorJob {
    /// Input feature map, DDR byte address
    pub ifm_addr: u32,
    /// Kernels, DDR byte address
    pub wt_addr: u32,
    /// Output accumulators, DDR byte address
    pub ofm_addr: u32,
    /// Input spatial dimension (square)
    pub ifm_dim: u32,
    /// Input depth
    pub ifm_depth: u32,
    /// Output spatial dimension (square)
    pub ofm_dim: u32,
    /// Output depth
    pub ofm_depth: u32,
}

impl AcceleratorJob {
    /// Kernel edge implied by the input and output dimensions.
    ///
    /// Returns `None` when the output is larger than the input.
    pub const fn kernel_dim(&self) -> Option<u32> {
        if self.ofm_dim == 0 || self.ofm_dim > self.ifm_dim {
            None
        } else {
            Some(self.ifm_dim - self.ofm_dim + 1)
        }
    }

    /// Multiply-accumulates the job performs.
    pub fn macs(&self) -> u64 {
        let k = u64::from(self.kernel_dim().unwrap_or(0));
        u64::from(self.ofm_depth)
            * u64::from(self.ofm_dim)
            * u64::from(self.ofm_dim)
            * u64::from(self.ifm_depth)
            * k
            * k
    }

    /// Input volume size in bytes.
    pub fn ifm_bytes(&self) -> usize {
        (self.ifm_depth * self.ifm_dim * self.ifm_dim) as usize
    }

    /// Kernel bytes.
    pub fn wt_bytes(&self) -> usize {
        let k = self.kernel_dim().unwrap_or(0);
        (self.ofm_depth * self.ifm_depth * k * k) as usize
    }

    /// Output accumulator count.
    pub fn ofm_len(&self) -> usize {
        (self.ofm_depth * self.ofm_dim * self.ofm_dim) as usize
    }
}

/// Submit `job` and wait for completion. Returns the number of status polls
/// that saw the accelerator busy.
///
/// Output accumulators are in DDR at `job.ofm_addr` once this returns.
pub fn run_accelerator<B: RegisterBus + ?Sized>(bus: &mut B, job: &AcceleratorJob) -> u64 {
    bus.write32(XCEL_IFM_DDR_ADDR, job.ifm_addr);
    bus.write32(XCEL_WT_DDR_ADDR, job.wt_addr);
    bus.write32(XCEL_OFM_DDR_ADDR, job.ofm_addr);
    bus.write32(XCEL_IFM_DIM, job.ifm_dim);
    bus.write32(XCEL_IFM_DEPTH, job.ifm_depth);
    bus.write32(XCEL_OFM_DIM, job.ofm_dim);
    bus.write32(XCEL_OFM_DEPTH, job.ofm_depth);
    bus.write32(XCEL_START, START);

    let mut polls = 0u64;
    while bus.read32(XCEL_STATUS) & status::DONE == 0 {
        polls += 1;
        std::hint::spin_loop();
    }

    debug!(
        "accel {}x{}x{} -> {}x{}x{} ({} MACs) done after {} busy polls",
        job.ifm_depth,
        job.ifm_dim,
        job.ifm_dim,
        job.ofm_depth,
        job.ofm_dim,
        job.ofm_dim,
        job.macs(),
        polls
    );
    polls
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONV1: AcceleratorJob = AcceleratorJob {
        ifm_addr: 0x0010_b4b4,
        wt_addr: 0x0010_9d6c,
        ofm_addr: 0x0090_0000,
        ifm_dim: 28,
        ifm_depth: 1,
        ofm_dim: 24,
        ofm_depth: 8,
    };

    #[test]
    fn conv1_geometry() {
        assert_eq!(CONV1.kernel_dim(), Some(5));
        assert_eq!(CONV1.macs(), 8 * 24 * 24 * 25);
        assert_eq!(CONV1.ifm_bytes(), 784);
        assert_eq!(CONV1.wt_bytes(), 200);
        assert_eq!(CONV1.ofm_len(), 4608);
    }

    #[test]
    fn output_larger_than_input_has_no_kernel() {
        let job = AcceleratorJob {
            ofm_dim: 30,
            ..CONV1
        };
        assert_eq!(job.kernel_dim(), None);
        assert_eq!(job.macs(), 0);
    }

    #[derive(Debug, Default)]
    struct RecordingBus {
        writes: Vec<(u32, u32)>,
    }

    impl RegisterBus for RecordingBus {
        fn read32(&mut self, _addr: u32) -> u32 {
            status::DONE
        }

        fn write32(&mut self, addr: u32, value: u32) {
            self.writes.push((addr, value));
        }
    }

    #[test]
    fn start_written_last() {
        let mut bus = RecordingBus::default();
        let busy = run_accelerator(&mut bus, &CONV1);
        assert_eq!(busy, 0);
        assert_eq!(bus.writes.len(), 8);
        assert_eq!(bus.writes.last(), Some(&(XCEL_START, START)));
        assert!(bus.writes.contains(&(XCEL_OFM_DEPTH, 8)));
    }
}
