//! Image batches and DDR staging
//!
//! A dataset is `N` 28×28 i8 images stored back to back plus one label byte
//! per image. Staging writes both into DDR at the fixed image and label
//! addresses, which is what the board's init program does before the core
//! starts.
//!
//! Synthetic batches are generated from a seed and labelled by
//! [`classify_host`], so a correct SoC run scores every image.

use crate::error::{ModelError, Result};
use crate::pipeline::classify_host;
use crate::rng::Xoshiro;
use crate::weights::LenetWeights;
use bytes::Bytes;
use lenet_driver::ExternalMemory;
use lenet_soc::memmap::{image_addr, LABELS_DDR_ADDR, MAX_IMAGES};
use lenet_soc::network::{FC_DEPTH, IMG_DIM, IMG_SIZE};
use std::path::Path;
use tracing::debug;

/// Test images with their ground-truth labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    images: Bytes,
    labels: Bytes,
}

impl Dataset {
    /// Build from an image blob (`N × 784` bytes) and a label blob
    /// (`N` bytes).
    ///
    /// # Errors
    ///
    /// Returns error if the image blob is not a whole number of images, the
    /// label count differs from the image count, a label is not a class, or
    /// the batch exceeds the DDR image region.
    pub fn new(images: impl Into<Bytes>, labels: impl Into<Bytes>) -> Result<Self> {
        let images = images.into();
        let labels = labels.into();
        if images.len() % IMG_SIZE != 0 {
            let whole = images.len() / IMG_SIZE;
            return Err(ModelError::size_mismatch(
                "images",
                (whole + 1) * IMG_SIZE,
                images.len(),
            ));
        }
        let count = images.len() / IMG_SIZE;
        if labels.len() != count {
            return Err(ModelError::size_mismatch("labels", count, labels.len()));
        }
        if count > MAX_IMAGES {
            return Err(ModelError::invalid_config(format!(
                "{count} images exceed the DDR image region ({MAX_IMAGES})"
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| usize::from(l) >= FC_DEPTH) {
            return Err(ModelError::invalid_config(format!(
                "label {bad} is not one of {FC_DEPTH} classes"
            )));
        }
        Ok(Self { images, labels })
    }

    /// Read an image file and a label file.
    ///
    /// # Errors
    ///
    /// Returns error if a file is missing or unreadable, or the contents fail
    /// the checks of [`Dataset::new`].
    pub fn from_files(images: impl AsRef<Path>, labels: impl AsRef<Path>) -> Result<Self> {
        let read = |path: &Path| -> Result<Vec<u8>> {
            if !path.exists() {
                return Err(ModelError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(std::fs::read(path)?)
        };
        let dataset = Self::new(read(images.as_ref())?, read(labels.as_ref())?)?;
        debug!("Loaded {} images from disk", dataset.len());
        Ok(dataset)
    }

    /// `count` pseudo-random images labelled by the host reference pipeline
    /// with `weights` and `shift`.
    ///
    /// Images are a dim background with a few bright strokes, which keeps
    /// the class scores spread out.
    ///
    /// # Errors
    ///
    /// Returns error if `count` exceeds the DDR image region.
    pub fn synthetic(seed: u64, count: usize, weights: &LenetWeights, shift: u32) -> Result<Self> {
        if count > MAX_IMAGES {
            return Err(ModelError::invalid_config(format!(
                "{count} images exceed the DDR image region ({MAX_IMAGES})"
            )));
        }
        let mut rng = Xoshiro::new(seed);
        let mut images = vec![0i8; count * IMG_SIZE];
        let mut labels = Vec::with_capacity(count);
        for image in images.chunks_exact_mut(IMG_SIZE) {
            synthesize_image(&mut rng, image);
            labels.push(classify_host(image, weights, shift).0);
        }
        debug!("Synthesized {} images (seed {})", count, seed);
        Ok(Self {
            images: Bytes::from(bytemuck::cast_slice::<i8, u8>(&images).to_vec()),
            labels: Bytes::from(labels),
        })
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Image `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn image(&self, index: usize) -> &[i8] {
        bytemuck::cast_slice(&self.images[index * IMG_SIZE..(index + 1) * IMG_SIZE])
    }

    /// Ground-truth label of image `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn label(&self, index: usize) -> u8 {
        self.labels[index]
    }

    /// All labels.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Write images and labels to their fixed DDR addresses.
    ///
    /// # Errors
    ///
    /// Returns error if DDR is too small for the layout.
    pub fn stage(&self, ddr: &mut ExternalMemory) -> Result<()> {
        ddr.write(image_addr(0), &self.images)?;
        ddr.write(LABELS_DDR_ADDR, &self.labels)?;
        debug!("Staged {} images and labels", self.len());
        Ok(())
    }
}

fn synthesize_image(rng: &mut Xoshiro, image: &mut [i8]) {
    for px in image.iter_mut() {
        *px = rng.range_i8(0, 15);
    }
    let strokes = rng.range_i32(2, 5);
    for _ in 0..strokes {
        let horizontal = rng.next_u64() & 1 == 0;
        let fixed = rng.range_i32(4, IMG_DIM as i32 - 5) as usize;
        let start = rng.range_i32(2, 12) as usize;
        let len = rng.range_i32(6, 14) as usize;
        let level = rng.range_i8(64, 127);
        for t in start..(start + len).min(IMG_DIM - 2) {
            let (r, c, dr, dc) = if horizontal {
                (fixed, t, 1, 0)
            } else {
                (t, fixed, 0, 1)
            };
            image[r * IMG_DIM + c] = level;
            image[(r + dr) * IMG_DIM + c + dc] = level;
        }
    }
}
