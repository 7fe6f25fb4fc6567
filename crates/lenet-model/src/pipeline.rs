//! Classification pipeline
//!
//! Runs LeNet over the staged image batch on a [`Platform`], image by image,
//! with the two convolutions executed either on the core or on the
//! accelerator.
//!
//! ```text
//!              Software                          Hardware
//! ──────────── ───────────────────────────────── ──────────────────────────────────
//! setup        DMA weights + labels → DMem       DMA weights + labels → DMem
//! conv1        DMA image → DMem, conv on core    accel(image, wt1) → spill A,
//!                                                DMA spill A → DMem
//! rescale      clamp_rescale on core             clamp_rescale on core
//! pool1        core                              core, DMA → spill A
//! conv2        conv on core                      accel(spill A, wt2) → spill B,
//!                                                DMA spill B → DMem
//! rescale      core                              core
//! pool2 / fc   core                              core
//! argmax       core                              core
//! ```
//!
//! Each image is timed with the counter reset / sample pair, and the cycle
//! counts are summed into the run total. Predictions are compared against
//! the labels loaded into DMem at setup.
//!
//! The per-image path has no error return: once [`Classifier::new`] has laid
//! out DMem, a peripheral that never completes hangs the run.

use crate::arena::LenetArena;
use crate::argmax::argmax;
use crate::conv::{conv3d, macs};
use crate::error::{ModelError, Result};
use crate::fc::fully_connected;
use crate::fixed::{checksum_i32, checksum_i8, rescale_volume};
use crate::layout::{KernelShape, Shape3};
use crate::pool::max_pool_relu;
use crate::weights::{LenetWeights, CONV1_KERNEL, CONV2_KERNEL};
use lenet_driver::{dma, measure, run_accelerator, AcceleratorJob, LocalRegion, Platform};
use lenet_soc::memmap::{
    image_addr, LABELS_DDR_ADDR, MAX_IMAGES, SPILL_A_DDR_ADDR, SPILL_B_DDR_ADDR,
    WT_CONV1_DDR_ADDR, WT_CONV2_DDR_ADDR, WT_FC_DDR_ADDR,
};
use lenet_soc::network::{
    CV1_DEPTH, CV1_DIM, CV2_DEPTH, CV2_DIM, FC_DEPTH, IMG_DEPTH, IMG_DIM, IMG_SIZE, P1_DEPTH,
    P1_DIM, P2_DEPTH, P2_DIM, RESCALE_SHIFT,
};
use tracing::{debug, info, trace, warn};

const IMAGE: Shape3 = Shape3::square(IMG_DEPTH, IMG_DIM);
const CONV1_OUT: Shape3 = Shape3::square(CV1_DEPTH, CV1_DIM);
const POOL1_OUT: Shape3 = Shape3::square(P1_DEPTH, P1_DIM);
const CONV2_OUT: Shape3 = Shape3::square(CV2_DEPTH, CV2_DIM);
const POOL2_OUT: Shape3 = Shape3::square(P2_DEPTH, P2_DIM);

/// Where the convolution layers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvStrategy {
    /// Shift-add convolution on the core.
    #[default]
    Software,
    /// Conv accelerator over DDR.
    Hardware,
}

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Convolution strategy
    pub strategy: ConvStrategy,
    /// Accumulator right-shift before saturation
    pub rescale_shift: u32,
    /// Images to classify, starting at index 0
    pub image_count: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            strategy: ConvStrategy::Software,
            rescale_shift: RESCALE_SHIFT,
            image_count: 128,
        }
    }
}

impl InferenceConfig {
    /// Set the convolution strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ConvStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the rescale shift.
    #[must_use]
    pub fn with_shift(mut self, shift: u32) -> Self {
        self.rescale_shift = shift;
        self
    }

    /// Set the number of images.
    #[must_use]
    pub fn with_image_count(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    /// Check the parameters against the fixed memory layout.
    ///
    /// # Errors
    ///
    /// Returns error if the image count exceeds the DDR image region or the
    /// shift is wider than an accumulator.
    pub fn validate(&self) -> Result<()> {
        if self.image_count > MAX_IMAGES {
            return Err(ModelError::invalid_config(format!(
                "{} images requested, DDR holds at most {MAX_IMAGES}",
                self.image_count
            )));
        }
        if self.rescale_shift > 31 {
            return Err(ModelError::invalid_config(format!(
                "rescale shift {} exceeds accumulator width",
                self.rescale_shift
            )));
        }
        Ok(())
    }
}

/// Outcome of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRecord {
    /// Image index in the batch
    pub index: usize,
    /// Predicted class
    pub predicted: u8,
    /// Ground-truth class
    pub expected: u8,
    /// Cycles spent on the image
    pub cycles: u32,
    /// Instructions retired on the image
    pub instructions: u32,
}

impl ClassificationRecord {
    /// Whether the prediction matches the ground truth.
    pub fn is_correct(&self) -> bool {
        self.predicted == self.expected
    }
}

/// Aggregate of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-image outcomes, in order
    pub records: Vec<ClassificationRecord>,
    /// Correct predictions
    pub correct: usize,
    /// Summed per-image cycle counts
    pub cycles: u64,
    /// Summed per-image instruction counts
    pub instructions: u64,
}

impl RunSummary {
    /// Images classified.
    pub fn images(&self) -> usize {
        self.records.len()
    }

    /// Mispredicted images.
    pub fn mispredicted(&self) -> usize {
        self.images() - self.correct
    }

    /// Fraction of correct predictions, 0 for an empty run.
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.correct as f64 / self.records.len() as f64
        }
    }

    /// Predicted classes, in image order.
    pub fn predictions(&self) -> Vec<u8> {
        self.records.iter().map(|r| r.predicted).collect()
    }

    fn push(&mut self, record: ClassificationRecord) {
        if record.is_correct() {
            self.correct += 1;
        }
        self.cycles += u64::from(record.cycles);
        self.instructions += u64::from(record.instructions);
        self.records.push(record);
    }
}

/// Drives a classification run on a platform whose DDR already holds the
/// weights, images and labels at their fixed addresses.
#[derive(Debug)]
pub struct Classifier<'p, P: Platform> {
    platform: &'p mut P,
    arena: LenetArena,
    config: InferenceConfig,
}

impl<'p, P: Platform> Classifier<'p, P> {
    /// Lay out DMem for `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or DMem is too small.
    pub fn new(platform: &'p mut P, config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        let arena = LenetArena::layout(platform.local().len_words(), config.image_count)?;
        Ok(Self {
            platform,
            arena,
            config,
        })
    }

    /// DMem layout of the run.
    pub fn arena(&self) -> &LenetArena {
        &self.arena
    }

    /// DMA the three weight banks and the label table into DMem.
    pub fn load_parameters(&mut self) {
        let a = &self.arena;
        let p = &mut *self.platform;
        dma::load_block(p, WT_CONV1_DDR_ADDR, a.wt_conv1.addr, word_len(a.wt_conv1));
        dma::load_block(p, WT_CONV2_DDR_ADDR, a.wt_conv2.addr, word_len(a.wt_conv2));
        dma::load_block(p, WT_FC_DDR_ADDR, a.wt_fc.addr, word_len(a.wt_fc));
        dma::load_block(p, LABELS_DDR_ADDR, a.labels.addr, word_len(a.labels));
        debug!("Loaded weights and {} labels", self.config.image_count);
    }

    /// Classify image `index`, timing it with the performance counters.
    ///
    /// Parameters must have been loaded with [`Self::load_parameters`].
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the configured image count.
    pub fn classify(&mut self, index: usize) -> ClassificationRecord {
        assert!(
            index < self.config.image_count,
            "image {index} outside run of {}",
            self.config.image_count
        );
        let arena = &self.arena;
        let config = &self.config;
        let m = measure(&mut *self.platform, |p| match config.strategy {
            ConvStrategy::Software => classify_software(p, arena, config.rescale_shift, index),
            ConvStrategy::Hardware => classify_hardware(p, arena, config.rescale_shift, index),
        });

        let expected = self.platform.local().bytes(arena.labels)[index];
        let record = ClassificationRecord {
            index,
            predicted: m.result,
            expected,
            cycles: m.cycles,
            instructions: m.instructions,
        };
        info!(
            "image {}: predicted {} expected {} ({} cycles)",
            index, record.predicted, record.expected, record.cycles
        );
        if !record.is_correct() {
            warn!(
                "image {} mispredicted: {} != {}",
                index, record.predicted, record.expected
            );
        }
        record
    }

    /// Load parameters, then classify every image of the run in order.
    pub fn run(&mut self) -> RunSummary {
        self.load_parameters();
        let mut summary = RunSummary::default();
        for index in 0..self.config.image_count {
            let record = self.classify(index);
            summary.push(record);
        }
        info!(
            "{:?} run: {}/{} correct, {} cycles",
            self.config.strategy,
            summary.correct,
            summary.images(),
            summary.cycles
        );
        summary
    }
}

fn word_len(region: LocalRegion) -> u32 {
    region.words as u32
}

fn classify_software<P: Platform>(p: &mut P, a: &LenetArena, shift: u32, index: usize) -> u8 {
    dma::load_block(p, image_addr(index), a.image.addr, word_len(a.image));

    conv_on_core(p, a.image, IMAGE, a.wt_conv1, CONV1_KERNEL, a.conv1_acc);
    rescale_pool(p, a.conv1_acc, CONV1_OUT, a.conv1_q, a.pool1, shift);
    conv_on_core(p, a.pool1, POOL1_OUT, a.wt_conv2, CONV2_KERNEL, a.conv2_acc);
    rescale_pool(p, a.conv2_acc, CONV2_OUT, a.conv2_q, a.pool2, shift);
    classify_pooled(p, a)
}

fn classify_hardware<P: Platform>(p: &mut P, a: &LenetArena, shift: u32, index: usize) -> u8 {
    run_accelerator(
        p,
        &AcceleratorJob {
            ifm_addr: image_addr(index),
            wt_addr: WT_CONV1_DDR_ADDR,
            ofm_addr: SPILL_A_DDR_ADDR,
            ifm_dim: IMG_DIM as u32,
            ifm_depth: IMG_DEPTH as u32,
            ofm_dim: CV1_DIM as u32,
            ofm_depth: CV1_DEPTH as u32,
        },
    );
    dma::load_block(p, SPILL_A_DDR_ADDR, a.conv1_acc.addr, word_len(a.conv1_acc));
    rescale_pool(p, a.conv1_acc, CONV1_OUT, a.conv1_q, a.pool1, shift);

    dma::store_block(p, a.pool1.addr, SPILL_A_DDR_ADDR, word_len(a.pool1));
    run_accelerator(
        p,
        &AcceleratorJob {
            ifm_addr: SPILL_A_DDR_ADDR,
            wt_addr: WT_CONV2_DDR_ADDR,
            ofm_addr: SPILL_B_DDR_ADDR,
            ifm_dim: P1_DIM as u32,
            ifm_depth: P1_DEPTH as u32,
            ofm_dim: CV2_DIM as u32,
            ofm_depth: CV2_DEPTH as u32,
        },
    );
    dma::load_block(p, SPILL_B_DDR_ADDR, a.conv2_acc.addr, word_len(a.conv2_acc));
    rescale_pool(p, a.conv2_acc, CONV2_OUT, a.conv2_q, a.pool2, shift);
    classify_pooled(p, a)
}

fn conv_on_core<P: Platform>(
    p: &mut P,
    input: LocalRegion,
    in_shape: Shape3,
    weights: LocalRegion,
    kernel: KernelShape,
    out: LocalRegion,
) {
    let (view, words) = p.local_mut().split_output(out);
    let acc: &mut [i32] = bytemuck::cast_slice_mut(words);
    let out_shape = conv3d(
        &view.i8s(input)[..in_shape.len()],
        in_shape,
        &view.i8s(weights)[..kernel.len()],
        kernel,
        &mut acc[..],
    );
    trace!("conv {:?} checksum {}", out_shape, checksum_i32(acc));
    p.retire(macs(in_shape, kernel));
}

/// Rescale `acc` into `q`, then pool `q` into `pooled`.
fn rescale_pool<P: Platform>(
    p: &mut P,
    acc: LocalRegion,
    shape: Shape3,
    q: LocalRegion,
    pooled: LocalRegion,
    shift: u32,
) {
    let local = p.local_mut();
    let (view, words) = local.split_output(q);
    let samples: &mut [i8] = &mut bytemuck::cast_slice_mut(words)[..shape.len()];
    rescale_volume(view.i32s(acc), shift, samples);

    let out_len = Shape3 {
        depth: shape.depth,
        height: shape.height / 2,
        width: shape.width / 2,
    }
    .len();
    let (view, words) = local.split_output(pooled);
    let out: &mut [i8] = &mut bytemuck::cast_slice_mut(words)[..out_len];
    let out_shape = max_pool_relu(&view.i8s(q)[..shape.len()], shape, out);
    trace!("pool {:?} checksum {}", out_shape, checksum_i8(out));

    // one op per rescale, four compares per pooled element
    p.retire((shape.len() + 4 * out_shape.len()) as u64);
}

fn classify_pooled<P: Platform>(p: &mut P, a: &LenetArena) -> u8 {
    let (view, words) = p.local_mut().split_output(a.scores);
    let scores: &mut [i32] = bytemuck::cast_slice_mut(words);
    let input = &view.i8s(a.pool2)[..POOL2_OUT.len()];
    fully_connected(input, view.i8s(a.wt_fc), scores);
    let class = argmax(scores).unwrap_or(0);
    trace!("fc scores {:?} -> {}", scores, class);
    p.retire((FC_DEPTH * POOL2_OUT.len() + FC_DEPTH) as u64);
    class as u8
}

/// Classify one image entirely on the host, without any SoC. Returns the
/// predicted class and the FC scores.
///
/// This is the reference the synthetic dataset is labelled with.
///
/// # Panics
///
/// Panics if `image` is not a full 28×28 image.
pub fn classify_host(image: &[i8], weights: &LenetWeights, shift: u32) -> (u8, [i32; FC_DEPTH]) {
    assert_eq!(image.len(), IMG_SIZE, "image length");
    let mut acc1 = vec![0i32; CONV1_OUT.len()];
    let mut q1 = vec![0i8; CONV1_OUT.len()];
    let mut p1 = vec![0i8; POOL1_OUT.len()];
    let mut acc2 = vec![0i32; CONV2_OUT.len()];
    let mut q2 = vec![0i8; CONV2_OUT.len()];
    let mut p2 = vec![0i8; POOL2_OUT.len()];
    let mut scores = [0i32; FC_DEPTH];

    conv3d(image, IMAGE, weights.conv1(), CONV1_KERNEL, &mut acc1);
    rescale_volume(&acc1, shift, &mut q1);
    max_pool_relu(&q1[..], CONV1_OUT, &mut p1);
    conv3d(&p1, POOL1_OUT, weights.conv2(), CONV2_KERNEL, &mut acc2);
    rescale_volume(&acc2, shift, &mut q2);
    max_pool_relu(&q2[..], CONV2_OUT, &mut p2);
    fully_connected(&p2, weights.fc(), &mut scores);

    let class = argmax(&scores).unwrap_or(0);
    (class as u8, scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(InferenceConfig::default().validate().is_ok());
        assert!(InferenceConfig::default()
            .with_image_count(MAX_IMAGES + 1)
            .validate()
            .is_err());
        assert!(InferenceConfig::default().with_shift(32).validate().is_err());
    }

    #[test]
    fn summary_accounting() {
        let mut s = RunSummary::default();
        for (i, (p, e)) in [(1u8, 1u8), (2, 3), (4, 4)].into_iter().enumerate() {
            s.push(ClassificationRecord {
                index: i,
                predicted: p,
                expected: e,
                cycles: 100,
                instructions: 10,
            });
        }
        assert_eq!(s.images(), 3);
        assert_eq!(s.correct, 2);
        assert_eq!(s.mispredicted(), 1);
        assert_eq!(s.cycles, 300);
        assert_eq!(s.predictions(), vec![1, 2, 4]);
        assert!((s.accuracy() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn host_reference_all_zero() {
        let (class, scores) = classify_host(&[0; IMG_SIZE], &LenetWeights::zeros(), RESCALE_SHIFT);
        assert_eq!(class, 0);
        assert_eq!(scores, [0; FC_DEPTH]);
    }
}
