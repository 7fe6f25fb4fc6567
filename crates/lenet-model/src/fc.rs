//! Fully-connected classifier layer

use crate::fixed::{multiply, widen};

/// Dot `input` against one weight row per class, one `i32` score per class
/// in `out`. Class `f` uses weights `f·len .. (f+1)·len` where `len` is the
/// input length. Scores are not rescaled.
///
/// # Panics
///
/// Panics if `weights` holds fewer than `out.len() × input.len()` values.
pub fn fully_connected(input: &[i8], weights: &[i8], out: &mut [i32]) {
    let len = input.len();
    assert!(
        weights.len() >= out.len() * len,
        "need {} weights, got {}",
        out.len() * len,
        weights.len()
    );
    for (f, score) in out.iter_mut().enumerate() {
        let row = &weights[f * len..(f + 1) * len];
        *score = input
            .iter()
            .zip(row)
            .fold(0i32, |acc, (&x, &w)| acc.wrapping_add(multiply(widen(x), widen(w))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_class() {
        let input = [1i8, 2, 3];
        let weights = [1i8, 0, 0, 0, 1, 0, 0, 0, 1, -1, -1, -1];
        let mut out = [0i32; 4];
        fully_connected(&input, &weights, &mut out);
        assert_eq!(out, [1, 2, 3, -6]);
    }

    #[test]
    fn no_rescale() {
        let input = [127i8; 256];
        let weights = [127i8; 256];
        let mut out = [0i32; 1];
        fully_connected(&input, &weights, &mut out);
        assert_eq!(out[0], 256 * 127 * 127);
    }

    #[test]
    #[should_panic(expected = "need 6 weights")]
    fn short_weights_panic() {
        let mut out = [0i32; 2];
        fully_connected(&[1, 2, 3], &[0; 5], &mut out);
    }
}
