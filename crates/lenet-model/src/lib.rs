#![deny(unsafe_code)]

//! Quantized LeNet-5 for the LeNet SoC
//!
//! Fixed-point arithmetic, the four layer kinds, the DMem arena and the
//! classification pipeline that drives the DMA engine and conv accelerator
//! through [`lenet_driver`].
//!
//! # Data flow
//!
//! ```text
//! image i8 ─▶ conv1 i32 ─▶ rescale i8 ─▶ pool1 i8 ─▶ conv2 i32 ─▶ rescale i8
//!          ─▶ pool2 i8 ─▶ fc i32 ×10 ─▶ argmax
//! ```
//!
//! # Example
//!
//! ```
//! use lenet_driver::{SocConfig, VirtualSoc};
//! use lenet_model::{Classifier, Dataset, InferenceConfig, LenetWeights};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let weights = LenetWeights::synthetic(1);
//! let dataset = Dataset::synthetic(2, 4, &weights, 9)?;
//!
//! let mut soc = VirtualSoc::new(SocConfig::default())?;
//! weights.stage(soc.ddr_mut())?;
//! dataset.stage(soc.ddr_mut())?;
//!
//! let config = InferenceConfig::default().with_image_count(dataset.len());
//! let summary = Classifier::new(&mut soc, config)?.run();
//! assert_eq!(summary.correct, 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod arena;
pub mod argmax;
pub mod conv;
mod dataset;
mod error;
pub mod fc;
pub mod fixed;
pub mod layout;
mod pipeline;
pub mod pool;
mod rng;
mod weights;

pub use arena::{LenetArena, WordArena};
pub use dataset::Dataset;
pub use error::{ModelError, Result};
pub use layout::{KernelShape, Shape3};
pub use pipeline::{
    classify_host, ClassificationRecord, Classifier, ConvStrategy, InferenceConfig, RunSummary,
};
pub use rng::Xoshiro;
pub use weights::{LenetWeights, CONV1_KERNEL, CONV2_KERNEL};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        ClassificationRecord, Classifier, ConvStrategy, Dataset, InferenceConfig, LenetWeights,
        Result, RunSummary,
    };
}
