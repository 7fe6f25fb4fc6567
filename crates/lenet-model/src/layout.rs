//! Flat-buffer tensor layout
//!
//! Feature maps are stored depth-major, then row-major:
//!
//! ```text
//! (d, i, j) of a D×H×W volume      →  d·H·W + i·W + j
//! (f, d, m, n) of an F×D×K×K kernel  →  f·D·K·K + d·K·K + m·K + n
//! ```
//!
//! The accelerator reads and writes external memory in the same layout.

/// Shape of a 3-D feature-map volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape3 {
    /// Channels
    pub depth: usize,
    /// Rows
    pub height: usize,
    /// Columns
    pub width: usize,
}

impl Shape3 {
    /// `depth × dim × dim` volume.
    pub const fn square(depth: usize, dim: usize) -> Self {
        Self {
            depth,
            height: dim,
            width: dim,
        }
    }

    /// Element count.
    pub const fn len(&self) -> usize {
        self.depth * self.height * self.width
    }

    /// Whether the volume holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements per channel.
    pub const fn plane(&self) -> usize {
        self.height * self.width
    }

    /// Flat offset of element `(d, i, j)`.
    #[inline]
    pub const fn offset(&self, d: usize, i: usize, j: usize) -> usize {
        d * self.plane() + i * self.width + j
    }

    /// 32-bit words needed to hold the volume as packed samples.
    pub const fn sample_words(&self) -> usize {
        self.len().div_ceil(4)
    }
}

/// Shape of a convolution kernel bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelShape {
    /// Output channels (filters)
    pub out_depth: usize,
    /// Input channels
    pub in_depth: usize,
    /// Kernel rows
    pub height: usize,
    /// Kernel columns
    pub width: usize,
}

impl KernelShape {
    /// `out_depth × in_depth × dim × dim` kernel bank.
    pub const fn square(out_depth: usize, in_depth: usize, dim: usize) -> Self {
        Self {
            out_depth,
            in_depth,
            height: dim,
            width: dim,
        }
    }

    /// Weight count.
    pub const fn len(&self) -> usize {
        self.out_depth * self.filter_len()
    }

    /// Whether the bank holds no weights.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weights per filter.
    pub const fn filter_len(&self) -> usize {
        self.in_depth * self.height * self.width
    }

    /// Flat offset of weight `(f, d, m, n)`.
    #[inline]
    pub const fn offset(&self, f: usize, d: usize, m: usize, n: usize) -> usize {
        f * self.filter_len() + d * self.height * self.width + m * self.width + n
    }

    /// Output volume of a stride-1, unpadded correlation over `input`.
    ///
    /// Returns `None` if the kernel is larger than the input or the depths
    /// disagree.
    pub const fn output_of(&self, input: Shape3) -> Option<Shape3> {
        if input.depth != self.in_depth
            || self.height > input.height
            || self.width > input.width
        {
            return None;
        }
        Some(Shape3 {
            depth: self.out_depth,
            height: input.height - self.height + 1,
            width: input.width - self.width + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_offsets_are_depth_major() {
        let s = Shape3 {
            depth: 3,
            height: 4,
            width: 5,
        };
        assert_eq!(s.offset(0, 0, 0), 0);
        assert_eq!(s.offset(0, 0, 1), 1);
        assert_eq!(s.offset(0, 1, 0), 5);
        assert_eq!(s.offset(1, 0, 0), 20);
        assert_eq!(s.offset(2, 3, 4), s.len() - 1);
    }

    #[test]
    fn kernel_offsets() {
        let k = KernelShape::square(16, 8, 5);
        assert_eq!(k.len(), 3200);
        assert_eq!(k.offset(1, 0, 0, 0), 200);
        assert_eq!(k.offset(0, 1, 0, 0), 25);
        assert_eq!(k.offset(15, 7, 4, 4), 3199);
    }

    #[test]
    fn conv_output_size() {
        let k1 = KernelShape::square(8, 1, 5);
        assert_eq!(k1.output_of(Shape3::square(1, 28)), Some(Shape3::square(8, 24)));
        let k2 = KernelShape::square(16, 8, 5);
        assert_eq!(k2.output_of(Shape3::square(8, 12)), Some(Shape3::square(16, 8)));
        assert_eq!(k2.output_of(Shape3::square(8, 4)), None);
        assert_eq!(k2.output_of(Shape3::square(1, 12)), None);
    }

    #[test]
    fn sample_words_round_up() {
        assert_eq!(Shape3::square(1, 28).sample_words(), 196);
        assert_eq!(Shape3::square(1, 3).sample_words(), 3);
    }
}
