//! Datapath of the virtual conv accelerator
//!
//! Computes in native wrapping i32 arithmetic, independent of the core's
//! shift-add multiplier, so comparing the two paths checks something.

use crate::accel::AcceleratorJob;
use crate::memory::ExternalMemory;

/// Execute `job` against DDR, writing raw accumulators to `job.ofm_addr`.
///
/// # Panics
///
/// Panics if the job geometry is degenerate (output larger than input) or
/// any of its three volumes lies outside DDR. Both are programming errors
/// of the code driving the device.
pub(crate) fn execute(ddr: &mut ExternalMemory, job: &AcceleratorJob) {
    let Some(k) = job.kernel_dim() else {
        panic!("accelerator job with output larger than input: {job:?}");
    };
    let k = k as usize;
    let in_dim = job.ifm_dim as usize;
    let in_depth = job.ifm_depth as usize;
    let out_dim = job.ofm_dim as usize;
    let out_depth = job.ofm_depth as usize;

    let ifm: Vec<i8> = bytemuck::cast_slice::<u8, i8>(
        ddr.slice(job.ifm_addr, job.ifm_bytes())
            .unwrap_or_else(|e| panic!("accelerator input: {e}")),
    )
    .to_vec();
    let wt: Vec<i8> = bytemuck::cast_slice::<u8, i8>(
        ddr.slice(job.wt_addr, job.wt_bytes())
            .unwrap_or_else(|e| panic!("accelerator weights: {e}")),
    )
    .to_vec();

    let mut ofm = vec![0i32; job.ofm_len()];
    for f in 0..out_depth {
        let wt_f = &wt[f * in_depth * k * k..(f + 1) * in_depth * k * k];
        for i in 0..out_dim {
            for j in 0..out_dim {
                let mut acc = 0i32;
                for d in 0..in_depth {
                    let plane = &ifm[d * in_dim * in_dim..(d + 1) * in_dim * in_dim];
                    let kern = &wt_f[d * k * k..(d + 1) * k * k];
                    for m in 0..k {
                        let row = &plane[(i + m) * in_dim + j..(i + m) * in_dim + j + k];
                        for (x, w) in row.iter().zip(&kern[m * k..(m + 1) * k]) {
                            acc = acc.wrapping_add(i32::from(*x).wrapping_mul(i32::from(*w)));
                        }
                    }
                }
                ofm[f * out_dim * out_dim + i * out_dim + j] = acc;
            }
        }
    }

    ddr.write(job.ofm_addr, bytemuck::cast_slice(&ofm))
        .unwrap_or_else(|e| panic!("accelerator output: {e}"));
}
