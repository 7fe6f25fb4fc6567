//! Software 3-D convolution
//!
//! `out[f, i, j] = Σ_d Σ_m Σ_n in[d, i+m, j+n] · w[f, d, m, n]`, stride 1,
//! no padding, accumulated in wrapping `i32` through the core's shift-add
//! [`multiply`]. The result is left un-rescaled; the pipeline applies
//! [`clamp_rescale`](crate::fixed::clamp_rescale) before pooling, as it does
//! to accelerator output.

use crate::fixed::{multiply, widen};
use crate::layout::{KernelShape, Shape3};

/// Correlate `input` with every filter of `weights`, writing raw
/// accumulators to `out`. Returns the output shape.
///
/// # Panics
///
/// Panics if the kernel does not fit the input, or if any buffer length
/// disagrees with its shape.
pub fn conv3d(
    input: &[i8],
    in_shape: Shape3,
    weights: &[i8],
    kernel: KernelShape,
    out: &mut [i32],
) -> Shape3 {
    let Some(out_shape) = kernel.output_of(in_shape) else {
        panic!("kernel {kernel:?} does not fit input {in_shape:?}");
    };
    assert_eq!(input.len(), in_shape.len(), "input length");
    assert_eq!(weights.len(), kernel.len(), "weight length");
    assert_eq!(out.len(), out_shape.len(), "output length");

    for f in 0..out_shape.depth {
        for i in 0..out_shape.height {
            for j in 0..out_shape.width {
                let mut acc = 0i32;
                for d in 0..in_shape.depth {
                    for m in 0..kernel.height {
                        for n in 0..kernel.width {
                            let x = widen(input[in_shape.offset(d, i + m, j + n)]);
                            let w = widen(weights[kernel.offset(f, d, m, n)]);
                            acc = acc.wrapping_add(multiply(x, w));
                        }
                    }
                }
                out[out_shape.offset(f, i, j)] = acc;
            }
        }
    }
    out_shape
}

/// Multiply-accumulates [`conv3d`] performs for `kernel` over `in_shape`.
pub fn macs(in_shape: Shape3, kernel: KernelShape) -> u64 {
    kernel
        .output_of(in_shape)
        .map_or(0, |o| (o.len() * kernel.filter_len()) as u64)
}
