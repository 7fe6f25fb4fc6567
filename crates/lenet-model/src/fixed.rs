//! Fixed-point arithmetic
//!
//! Samples are `i8`, every product and sum is carried in an `i32`
//! accumulator, and the only narrowing point is [`clamp_rescale`] after each
//! convolution layer.
//!
//! The core has no hardware multiplier, so [`multiply`] is the shift-add
//! loop the firmware runs. It agrees bit for bit with a wrapping 32-bit
//! multiply, overflow included.

/// Signed 32-bit multiply by shift-and-add over the operand magnitudes.
///
/// Bit-identical to `a.wrapping_mul(b)` for every input, `i32::MIN`
/// included.
pub fn multiply(a: i32, b: i32) -> i32 {
    let mut x = a.unsigned_abs();
    let mut y = b.unsigned_abs();
    let mut product = 0u32;
    while y != 0 {
        if y & 1 != 0 {
            product = product.wrapping_add(x);
        }
        x = x.wrapping_shl(1);
        y >>= 1;
    }
    let product = product as i32;
    if (a < 0) != (b < 0) {
        product.wrapping_neg()
    } else {
        product
    }
}

/// Sign-extend a sample to accumulator width.
#[inline]
pub fn widen(sample: i8) -> i32 {
    i32::from(sample)
}

/// Arithmetic right shift by `shift`, then saturate into the sample range.
///
/// Shifts of 32 or more behave like 31: the result is the sign of `acc`.
pub fn clamp_rescale(acc: i32, shift: u32) -> i8 {
    let v = (acc >> shift.min(31)).clamp(i32::from(i8::MIN), i32::from(i8::MAX));
    v as i8
}

/// Rescale a whole accumulator volume into `out`.
///
/// # Panics
///
/// Panics if `acc` and `out` differ in length.
pub fn rescale_volume(acc: &[i32], shift: u32, out: &mut [i8]) {
    assert_eq!(acc.len(), out.len(), "rescale length mismatch");
    for (o, &a) in out.iter_mut().zip(acc) {
        *o = clamp_rescale(a, shift);
    }
}

/// Wrapping sum of a sample volume.
pub fn checksum_i8(v: &[i8]) -> i32 {
    v.iter().fold(0i32, |s, &x| s.wrapping_add(widen(x)))
}

/// Wrapping sum of an accumulator volume.
pub fn checksum_i32(v: &[i32]) -> i32 {
    v.iter().fold(0i32, |s, &x| s.wrapping_add(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_matches_wrapping_mul() {
        let samples = [
            0,
            1,
            -1,
            2,
            -7,
            127,
            -128,
            255,
            12_345,
            -54_321,
            65_536,
            i32::MAX,
            i32::MIN,
            i32::MIN + 1,
        ];
        for &a in &samples {
            for &b in &samples {
                assert_eq!(multiply(a, b), a.wrapping_mul(b), "{a} * {b}");
            }
        }
    }

    #[test]
    fn multiply_overflow_wraps() {
        assert_eq!(multiply(65_536, 65_536), 0);
        assert_eq!(multiply(i32::MAX, 2), -2);
        assert_eq!(multiply(i32::MIN, -1), i32::MIN);
    }

    #[test]
    fn widen_sign_extends() {
        assert_eq!(widen(-1), -1);
        assert_eq!(widen(-128), -128);
        assert_eq!(widen(127), 127);
    }

    #[test]
    fn clamp_rescale_saturates() {
        assert_eq!(clamp_rescale(-128, 0), -128);
        assert_eq!(clamp_rescale(-129, 0), -128);
        assert_eq!(clamp_rescale(127, 0), 127);
        assert_eq!(clamp_rescale(128, 0), 127);
        assert_eq!(clamp_rescale(127 << 9, 9), 127);
        assert_eq!(clamp_rescale(128 << 9, 9), 127);
        assert_eq!(clamp_rescale(i32::MIN, 9), -128);
    }

    #[test]
    fn clamp_rescale_floors_negative() {
        // arithmetic shift rounds toward negative infinity
        assert_eq!(clamp_rescale(-1, 9), -1);
        assert_eq!(clamp_rescale(511, 9), 0);
        assert_eq!(clamp_rescale(512, 9), 1);
    }

    #[test]
    fn clamp_rescale_monotonic() {
        let mut prev = i8::MIN;
        let mut acc = -200_000;
        while acc <= 200_000 {
            let v = clamp_rescale(acc, 9);
            assert!(v >= prev, "not monotonic at {acc}");
            prev = v;
            acc += 97;
        }
    }

    #[test]
    fn large_shift_keeps_sign() {
        assert_eq!(clamp_rescale(-5, 40), -1);
        assert_eq!(clamp_rescale(5, 40), 0);
    }

    #[test]
    fn checksums_wrap() {
        assert_eq!(checksum_i8(&[-1, 2, 127]), 128);
        assert_eq!(checksum_i32(&[i32::MAX, 1]), i32::MIN);
    }
}
