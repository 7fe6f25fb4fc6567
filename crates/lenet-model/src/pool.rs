//! 2×2 max pooling with fused ReLU
//!
//! Each output element is the maximum of the rectified 2×2 block at twice
//! its coordinates. Odd trailing rows and columns are dropped.

use crate::layout::Shape3;

/// Pool `input` into `out`, returning the output shape.
///
/// Values are rectified before the max, so an all-negative block pools to
/// zero. Results above the sample range saturate to `i8::MAX`.
///
/// # Panics
///
/// Panics if a buffer length disagrees with its shape.
pub fn max_pool_relu<T>(input: &[T], in_shape: Shape3, out: &mut [i8]) -> Shape3
where
    T: Copy + Into<i32>,
{
    let out_shape = Shape3 {
        depth: in_shape.depth,
        height: in_shape.height / 2,
        width: in_shape.width / 2,
    };
    assert_eq!(input.len(), in_shape.len(), "input length");
    assert_eq!(out.len(), out_shape.len(), "output length");

    for d in 0..out_shape.depth {
        for i in 0..out_shape.height {
            for j in 0..out_shape.width {
                let mut max = 0i32;
                for (m, n) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                    let v: i32 = input[in_shape.offset(d, 2 * i + m, 2 * j + n)].into();
                    max = max.max(v);
                }
                out[out_shape.offset(d, i, j)] = i8::try_from(max).unwrap_or(i8::MAX);
            }
        }
    }
    out_shape
}
