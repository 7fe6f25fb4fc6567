//! LeNet layer geometry.
//!
//! ```text
//! image   28×28×1
//! conv1   5×5, 8 filters     → 24×24×8   (i32 accumulators)
//! pool1   2×2 max + ReLU     → 12×12×8
//! conv2   5×5, 16 filters    →  8×8×16   (i32 accumulators)
//! pool2   2×2 max + ReLU     →  4×4×16
//! fc      4×4×16 → 10 classes
//! ```
//!
//! All sizes are element counts. Sample volumes are one byte per element,
//! accumulator volumes four.

/// Spatial output size of a stride-1, unpadded convolution.
#[must_use]
pub const fn conv_out_dim(in_dim: usize, kernel_dim: usize) -> usize {
    in_dim - kernel_dim + 1
}

/// Spatial output size of a 2×2, stride-2 pool.
#[must_use]
pub const fn pool_out_dim(in_dim: usize) -> usize {
    in_dim / 2
}

/// Input image edge.
pub const IMG_DIM: usize = 28;
/// Input image channels.
pub const IMG_DEPTH: usize = 1;
/// Bytes per image.
pub const IMG_SIZE: usize = IMG_DIM * IMG_DIM * IMG_DEPTH;

/// conv1 kernel edge.
pub const WT1_DIM: usize = 5;
/// conv1 output edge.
pub const CV1_DIM: usize = conv_out_dim(IMG_DIM, WT1_DIM);
/// conv1 filters.
pub const CV1_DEPTH: usize = 8;
/// conv1 accumulator count.
pub const CONV1_OFM_SIZE: usize = CV1_DEPTH * CV1_DIM * CV1_DIM;

/// pool1 output edge.
pub const P1_DIM: usize = pool_out_dim(CV1_DIM);
/// pool1 channels.
pub const P1_DEPTH: usize = CV1_DEPTH;
/// pool1 sample count.
pub const POOL1_OFM_SIZE: usize = P1_DEPTH * P1_DIM * P1_DIM;

/// conv2 kernel edge.
pub const WT2_DIM: usize = 5;
/// conv2 output edge.
pub const CV2_DIM: usize = conv_out_dim(P1_DIM, WT2_DIM);
/// conv2 filters.
pub const CV2_DEPTH: usize = 16;
/// conv2 accumulator count.
pub const CONV2_OFM_SIZE: usize = CV2_DEPTH * CV2_DIM * CV2_DIM;

/// pool2 output edge.
pub const P2_DIM: usize = pool_out_dim(CV2_DIM);
/// pool2 channels.
pub const P2_DEPTH: usize = CV2_DEPTH;
/// pool2 sample count.
pub const POOL2_OFM_SIZE: usize = P2_DEPTH * P2_DIM * P2_DIM;

/// Number of output classes.
pub const FC_DEPTH: usize = 10;

/// conv1 weight bytes (`CV1_DEPTH × IMG_DEPTH × 5 × 5`).
pub const WT_CONV1_SIZE: usize = CV1_DEPTH * IMG_DEPTH * WT1_DIM * WT1_DIM;
/// conv2 weight bytes (`CV2_DEPTH × P1_DEPTH × 5 × 5`).
pub const WT_CONV2_SIZE: usize = CV2_DEPTH * P1_DEPTH * WT2_DIM * WT2_DIM;
/// FC weight bytes (`FC_DEPTH × POOL2_OFM_SIZE`).
pub const WT_FC_SIZE: usize = FC_DEPTH * POOL2_OFM_SIZE;
/// Total weight bytes, in staging order conv1 ‖ conv2 ‖ fc.
pub const WT_TOTAL_SIZE: usize = WT_CONV1_SIZE + WT_CONV2_SIZE + WT_FC_SIZE;

/// Default accumulator right-shift applied before saturation.
pub const RESCALE_SHIFT: u32 = 9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_dims() {
        assert_eq!(CV1_DIM, 24);
        assert_eq!(P1_DIM, 12);
        assert_eq!(CV2_DIM, 8);
        assert_eq!(P2_DIM, 4);
    }

    #[test]
    fn weight_sizes() {
        assert_eq!(WT_CONV1_SIZE, 200);
        assert_eq!(WT_CONV2_SIZE, 3200);
        assert_eq!(WT_FC_SIZE, 2560);
    }

    #[test]
    fn sample_volumes_are_whole_words() {
        // The DMA moves 32-bit words.
        assert_eq!(IMG_SIZE % 4, 0);
        assert_eq!(POOL1_OFM_SIZE % 4, 0);
        assert_eq!(WT_CONV1_SIZE % 4, 0);
        assert_eq!(WT_CONV2_SIZE % 4, 0);
        assert_eq!(WT_FC_SIZE % 4, 0);
    }
}
