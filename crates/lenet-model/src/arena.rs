//! Local scratch arena
//!
//! DMem is carved into fixed regions once per run and reused for every
//! image. A bump allocator hands out word-aligned regions; nothing is ever
//! freed before the run ends.
//!
//! ```text
//! region      type   elements           loaded by
//! ─────────── ────── ────────────────── ──────────────────────────
//! wt_conv1    i8     8×1×5×5            DMA, once per run
//! wt_conv2    i8     16×8×5×5           DMA, once per run
//! wt_fc       i8     10×16×4×4          DMA, once per run
//! labels      u8     one per image      DMA, once per run
//! image       i8     1×28×28            DMA, per image (software conv)
//! conv1_acc   i32    8×24×24            conv1 / DMA from spill A
//! conv1_q     i8     8×24×24            rescale
//! pool1       i8     8×12×12            pool, DMA to spill A
//! conv2_acc   i32    16×8×8             conv2 / DMA from spill B
//! conv2_q     i8     16×8×8             rescale
//! pool2       i8     16×4×4             pool
//! scores      i32    10                 fc
//! ```

use crate::error::{ModelError, Result};
use lenet_driver::LocalRegion;
use lenet_soc::network::{
    CONV1_OFM_SIZE, CONV2_OFM_SIZE, FC_DEPTH, IMG_SIZE, POOL1_OFM_SIZE, POOL2_OFM_SIZE,
    WT_CONV1_SIZE, WT_CONV2_SIZE, WT_FC_SIZE,
};
use tracing::debug;

/// Bump allocator over DMem word addresses.
#[derive(Debug, Clone)]
pub struct WordArena {
    next: usize,
    limit: usize,
}

impl WordArena {
    /// Arena over words `0..limit`.
    pub fn new(limit: usize) -> Self {
        Self { next: 0, limit }
    }

    /// Allocate `words` words.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than `words` words remain.
    pub fn alloc(&mut self, words: usize) -> Result<LocalRegion> {
        if words > self.remaining() {
            return Err(ModelError::ArenaExhausted {
                requested: words,
                available: self.remaining(),
            });
        }
        let addr = u32::try_from(self.next)
            .map_err(|_| ModelError::invalid_config("DMem exceeds 32-bit word addressing"))?;
        self.next += words;
        Ok(LocalRegion::new(addr, words))
    }

    /// Allocate room for `bytes` packed bytes, rounded up to whole words.
    ///
    /// # Errors
    ///
    /// Returns error if the arena is exhausted.
    pub fn alloc_bytes(&mut self, bytes: usize) -> Result<LocalRegion> {
        self.alloc(bytes.div_ceil(4))
    }

    /// Words handed out so far.
    pub fn used(&self) -> usize {
        self.next
    }

    /// Words still available.
    pub fn remaining(&self) -> usize {
        self.limit - self.next
    }
}

/// Every DMem region a classification run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LenetArena {
    /// conv1 kernels
    pub wt_conv1: LocalRegion,
    /// conv2 kernels
    pub wt_conv2: LocalRegion,
    /// FC weights
    pub wt_fc: LocalRegion,
    /// Ground-truth labels, one byte each
    pub labels: LocalRegion,
    /// Current image
    pub image: LocalRegion,
    /// conv1 raw accumulators
    pub conv1_acc: LocalRegion,
    /// conv1 rescaled samples
    pub conv1_q: LocalRegion,
    /// pool1 output
    pub pool1: LocalRegion,
    /// conv2 raw accumulators
    pub conv2_acc: LocalRegion,
    /// conv2 rescaled samples
    pub conv2_q: LocalRegion,
    /// pool2 output
    pub pool2: LocalRegion,
    /// FC class scores
    pub scores: LocalRegion,
}

impl LenetArena {
    /// Lay out a run of `image_count` images in a DMem of `local_words`
    /// words.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ArenaExhausted`] if DMem is too small.
    pub fn layout(local_words: usize, image_count: usize) -> Result<Self> {
        let mut a = WordArena::new(local_words);
        let arena = Self {
            wt_conv1: a.alloc_bytes(WT_CONV1_SIZE)?,
            wt_conv2: a.alloc_bytes(WT_CONV2_SIZE)?,
            wt_fc: a.alloc_bytes(WT_FC_SIZE)?,
            labels: a.alloc_bytes(image_count)?,
            image: a.alloc_bytes(IMG_SIZE)?,
            conv1_acc: a.alloc(CONV1_OFM_SIZE)?,
            conv1_q: a.alloc_bytes(CONV1_OFM_SIZE)?,
            pool1: a.alloc_bytes(POOL1_OFM_SIZE)?,
            conv2_acc: a.alloc(CONV2_OFM_SIZE)?,
            conv2_q: a.alloc_bytes(CONV2_OFM_SIZE)?,
            pool2: a.alloc_bytes(POOL2_OFM_SIZE)?,
            scores: a.alloc(FC_DEPTH)?,
        };
        debug!(
            "DMem arena: {} of {} words used ({} labels)",
            a.used(),
            local_words,
            image_count
        );
        Ok(arena)
    }

    /// All regions with their names, in address order.
    pub fn regions(&self) -> [(&'static str, LocalRegion); 12] {
        [
            ("wt_conv1", self.wt_conv1),
            ("wt_conv2", self.wt_conv2),
            ("wt_fc", self.wt_fc),
            ("labels", self.labels),
            ("image", self.image),
            ("conv1_acc", self.conv1_acc),
            ("conv1_q", self.conv1_q),
            ("pool1", self.pool1),
            ("conv2_acc", self.conv2_acc),
            ("conv2_q", self.conv2_q),
            ("pool2", self.pool2),
            ("scores", self.scores),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_allocation() {
        let mut a = WordArena::new(10);
        assert_eq!(a.alloc(4).unwrap(), LocalRegion::new(0, 4));
        assert_eq!(a.alloc_bytes(5).unwrap(), LocalRegion::new(4, 2));
        assert_eq!(a.remaining(), 4);
        assert!(matches!(
            a.alloc(5),
            Err(ModelError::ArenaExhausted {
                requested: 5,
                available: 4
            })
        ));
    }

    #[test]
    fn lenet_regions_disjoint() {
        let arena = LenetArena::layout(16 * 1024, 128).unwrap();
        let regions = arena.regions();
        for pair in regions.windows(2) {
            assert!(!pair[0].1.overlaps(&pair[1].1), "{} / {}", pair[0].0, pair[1].0);
            assert_eq!(pair[0].1.range().end, pair[1].1.range().start);
        }
        assert_eq!(arena.labels.words, 32);
        assert_eq!(arena.image.words, 196);
    }

    #[test]
    fn label_words_round_up() {
        let arena = LenetArena::layout(16 * 1024, 5).unwrap();
        assert_eq!(arena.labels.words, 2);
    }

    #[test]
    fn small_dmem_rejected() {
        assert!(matches!(
            LenetArena::layout(4096, 1),
            Err(ModelError::ArenaExhausted { .. })
        ));
    }
}
