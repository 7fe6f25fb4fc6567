//! Quantized LeNet weights
//!
//! A weight set is three i8 kernel banks stored back to back, in the order
//! they are staged to DDR: conv1 ‖ conv2 ‖ fc. Each bank is a zero-copy
//! slice of the blob it was loaded from.

use crate::error::{ModelError, Result};
use crate::layout::KernelShape;
use crate::rng::Xoshiro;
use bytes::Bytes;
use lenet_driver::ExternalMemory;
use lenet_soc::memmap::{WT_CONV1_DDR_ADDR, WT_CONV2_DDR_ADDR, WT_FC_DDR_ADDR};
use lenet_soc::network::{
    CV1_DEPTH, CV2_DEPTH, IMG_DEPTH, P1_DEPTH, WT1_DIM, WT2_DIM, WT_CONV1_SIZE, WT_CONV2_SIZE,
    WT_FC_SIZE, WT_TOTAL_SIZE,
};
use std::path::Path;
use tracing::debug;

/// conv1 kernel bank shape.
pub const CONV1_KERNEL: KernelShape = KernelShape::square(CV1_DEPTH, IMG_DEPTH, WT1_DIM);
/// conv2 kernel bank shape.
pub const CONV2_KERNEL: KernelShape = KernelShape::square(CV2_DEPTH, P1_DEPTH, WT2_DIM);

/// LeNet weight set.
#[derive(Debug, Clone)]
pub struct LenetWeights {
    conv1: Bytes,
    conv2: Bytes,
    fc: Bytes,
}

impl LenetWeights {
    /// Split a conv1 ‖ conv2 ‖ fc blob into its three banks.
    ///
    /// # Errors
    ///
    /// Returns error if the blob is not exactly the size of a weight set.
    pub fn from_blob(blob: impl Into<Bytes>) -> Result<Self> {
        let blob = blob.into();
        if blob.len() != WT_TOTAL_SIZE {
            return Err(ModelError::size_mismatch("weights", WT_TOTAL_SIZE, blob.len()));
        }
        Ok(Self::split(&blob))
    }

    fn split(blob: &Bytes) -> Self {
        let conv2_end = WT_CONV1_SIZE + WT_CONV2_SIZE;
        Self {
            conv1: blob.slice(..WT_CONV1_SIZE),
            conv2: blob.slice(WT_CONV1_SIZE..conv2_end),
            fc: blob.slice(conv2_end..),
        }
    }

    /// Read a weight blob from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable or mis-sized.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let blob = std::fs::read(path)?;
        debug!("Loaded {} weight bytes from {}", blob.len(), path.display());
        Self::from_blob(blob)
    }

    /// All-zero weights.
    pub fn zeros() -> Self {
        Self::split(&Bytes::from(vec![0u8; WT_TOTAL_SIZE]))
    }

    /// Deterministic pseudo-random weights in `-32..=31`.
    pub fn synthetic(seed: u64) -> Self {
        let mut rng = Xoshiro::new(seed);
        let blob: Vec<u8> = (0..WT_TOTAL_SIZE)
            .map(|_| rng.range_i8(-32, 31) as u8)
            .collect();
        Self::split(&Bytes::from(blob))
    }

    /// conv1 kernels, `8×1×5×5`.
    pub fn conv1(&self) -> &[i8] {
        bytemuck::cast_slice(&self.conv1[..])
    }

    /// conv2 kernels, `16×8×5×5`.
    pub fn conv2(&self) -> &[i8] {
        bytemuck::cast_slice(&self.conv2[..])
    }

    /// FC weights, one `16×4×4` row per class.
    pub fn fc(&self) -> &[i8] {
        bytemuck::cast_slice(&self.fc[..])
    }

    /// Write the three banks to their fixed DDR addresses.
    ///
    /// # Errors
    ///
    /// Returns error if DDR is too small for the layout.
    pub fn stage(&self, ddr: &mut ExternalMemory) -> Result<()> {
        ddr.write(WT_CONV1_DDR_ADDR, &self.conv1)?;
        ddr.write(WT_CONV2_DDR_ADDR, &self.conv2)?;
        ddr.write(WT_FC_DDR_ADDR, &self.fc)?;
        debug!("Staged {} weight bytes", WT_TOTAL_SIZE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_split_in_staging_order() {
        let blob: Vec<u8> = (0..WT_TOTAL_SIZE).map(|i| (i % 251) as u8).collect();
        let w = LenetWeights::from_blob(blob.clone()).unwrap();
        assert_eq!(w.conv1().len(), WT_CONV1_SIZE);
        assert_eq!(w.conv2().len(), CONV2_KERNEL.len());
        assert_eq!(w.fc().len(), WT_FC_SIZE);
        assert_eq!(w.conv2()[0] as u8, blob[WT_CONV1_SIZE]);
        assert_eq!(w.fc()[0] as u8, blob[WT_CONV1_SIZE + WT_CONV2_SIZE]);
    }

    #[test]
    fn wrong_size_rejected() {
        let err = LenetWeights::from_blob(vec![0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::SizeMismatch {
                expected: WT_TOTAL_SIZE,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn synthetic_is_deterministic() {
        let a = LenetWeights::synthetic(3);
        let b = LenetWeights::synthetic(3);
        assert_eq!(a.fc(), b.fc());
        assert!(a.conv1().iter().all(|w| (-32..=31).contains(w)));
        assert!(a.conv1().iter().any(|&w| w != 0));
    }

    #[test]
    fn staged_at_fixed_addresses() {
        let w = LenetWeights::synthetic(9);
        let mut ddr = ExternalMemory::new(lenet_soc::memmap::MIN_DDR_BYTES);
        w.stage(&mut ddr).unwrap();
        let fc = ddr.slice(WT_FC_DDR_ADDR, WT_FC_SIZE).unwrap();
        assert_eq!(bytemuck::cast_slice::<u8, i8>(fc), w.fc());
    }

    #[test]
    fn missing_file() {
        let err = LenetWeights::from_file("/nonexistent/lenet.bin").unwrap_err();
        assert!(matches!(err, ModelError::FileNotFound { .. }));
    }
}
