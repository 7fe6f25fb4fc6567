//! External memory (DDR) layout.
//!
//! Addresses are DDR byte addresses, as staged by the init program that runs
//! on the host side before the core boots.
//!
//! ```text
//! Address    Size            Contents
//! ────────── ─────────────── ────────────────────────────────────────────
//! 0x109d6c   200 B           conv1 weights  (8×1×5×5 i8)
//! 0x109e34   3200 B          conv2 weights  (16×8×5×5 i8)
//! 0x10aab4   2560 B          fc weights     (10×16×4×4 i8)
//! 0x10b4b4   N × 784 B       test images    (28×28 i8, contiguous)
//! 0x8855b4   N B             ground-truth labels (one byte each)
//! 0x900000   18 KB           accelerator spill A: conv1 OFM / pool1 IFM
//! 0x910000   4 KB            accelerator spill B: conv2 OFM
//! ```

use crate::network::{CONV1_OFM_SIZE, CONV2_OFM_SIZE, IMG_SIZE, POOL1_OFM_SIZE};

/// conv1 weights.
pub const WT_CONV1_DDR_ADDR: u32 = 0x0010_9d6c;
/// conv2 weights.
pub const WT_CONV2_DDR_ADDR: u32 = 0x0010_9e34;
/// Fully-connected weights.
pub const WT_FC_DDR_ADDR: u32 = 0x0010_aab4;
/// First test image.
pub const IMAGES_DDR_ADDR: u32 = 0x0010_b4b4;
/// First ground-truth label.
pub const LABELS_DDR_ADDR: u32 = 0x0088_55b4;

/// Number of images the image region holds before running into the labels.
pub const MAX_IMAGES: usize = (LABELS_DDR_ADDR - IMAGES_DDR_ADDR) as usize / IMG_SIZE;

/// Accelerator spill area A: conv1 output, then pool1 output as conv2 input.
pub const SPILL_A_DDR_ADDR: u32 = 0x0090_0000;
/// Accelerator spill area B: conv2 output.
pub const SPILL_B_DDR_ADDR: u32 = 0x0091_0000;

/// Smallest DDR size that holds every region above.
pub const MIN_DDR_BYTES: usize = SPILL_B_DDR_ADDR as usize + CONV2_OFM_SIZE * 4;

/// Typical DDR size of the board (16 MB).
pub const DDR_BYTES: usize = 16 * 1024 * 1024;

/// DDR byte address of image `index`.
#[must_use]
pub const fn image_addr(index: usize) -> u32 {
    IMAGES_DDR_ADDR + (index * IMG_SIZE) as u32
}

/// DDR byte address of label `index`.
#[must_use]
pub const fn label_addr(index: usize) -> u32 {
    LABELS_DDR_ADDR + index as u32
}

/// Named DDR region, for `lenet regs` and staging bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// conv1 weights.
    WeightsConv1,
    /// conv2 weights.
    WeightsConv2,
    /// FC weights.
    WeightsFc,
    /// Image batch.
    Images,
    /// Label batch.
    Labels,
    /// Accelerator spill A.
    SpillA,
    /// Accelerator spill B.
    SpillB,
}

impl Region {
    /// Every region in address order.
    pub const ALL: [Self; 7] = [
        Self::WeightsConv1,
        Self::WeightsConv2,
        Self::WeightsFc,
        Self::Images,
        Self::Labels,
        Self::SpillA,
        Self::SpillB,
    ];

    /// Base DDR byte address.
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::WeightsConv1 => WT_CONV1_DDR_ADDR,
            Self::WeightsConv2 => WT_CONV2_DDR_ADDR,
            Self::WeightsFc => WT_FC_DDR_ADDR,
            Self::Images => IMAGES_DDR_ADDR,
            Self::Labels => LABELS_DDR_ADDR,
            Self::SpillA => SPILL_A_DDR_ADDR,
            Self::SpillB => SPILL_B_DDR_ADDR,
        }
    }

    /// Capacity in bytes (images and labels sized for [`MAX_IMAGES`]).
    #[must_use]
    pub const fn capacity(self) -> usize {
        use crate::network::{WT_CONV1_SIZE, WT_CONV2_SIZE, WT_FC_SIZE};
        match self {
            Self::WeightsConv1 => WT_CONV1_SIZE,
            Self::WeightsConv2 => WT_CONV2_SIZE,
            Self::WeightsFc => WT_FC_SIZE,
            Self::Images => MAX_IMAGES * IMG_SIZE,
            Self::Labels => MAX_IMAGES,
            Self::SpillA => {
                if CONV1_OFM_SIZE * 4 > POOL1_OFM_SIZE {
                    CONV1_OFM_SIZE * 4
                } else {
                    POOL1_OFM_SIZE
                }
            }
            Self::SpillB => CONV2_OFM_SIZE * 4,
        }
    }

    /// Short name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WeightsConv1 => "wt_conv1",
            Self::WeightsConv2 => "wt_conv2",
            Self::WeightsFc => "wt_fc",
            Self::Images => "images",
            Self::Labels => "labels",
            Self::SpillA => "spill_a",
            Self::SpillB => "spill_b",
        }
    }
}
