//! `lenet` — command-line interface for LeNet-5 on the virtual SoC.
//!
//! ```text
//! USAGE:
//!   lenet classify [--hw] [--images N]   Classify a batch, print per-image results
//!   lenet dma-loopback [--words N]       DMem -> DDR -> DMem round trip
//!   lenet regs                           Print the register and DDR maps
//! ```
//!
//! Without `--weights` / `--image-file` the batch is synthetic, labelled by
//! the host reference pipeline.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use lenet_driver::{dma, measure, SocConfig, VirtualSoc};
use lenet_model::{Classifier, ConvStrategy, Dataset, InferenceConfig, LenetWeights};
use lenet_soc::memmap::{Region, DDR_BYTES, SPILL_A_DDR_ADDR};
use lenet_soc::network::RESCALE_SHIFT;
use lenet_soc::regs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lenet", about = "Quantized LeNet-5 on a virtual SoC", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Classify a batch of images and report accuracy and cycle count.
    Classify {
        /// Run the convolutions on the accelerator instead of the core.
        #[arg(long)]
        hw: bool,
        /// Number of images to classify.
        #[arg(long, default_value_t = 128)]
        images: usize,
        /// Right shift applied when rescaling accumulators to int8.
        #[arg(long, default_value_t = RESCALE_SHIFT)]
        shift: u32,
        /// Seed for synthetic weights and images.
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Weight blob (conv1, conv2, fc back to back).
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Image blob (N × 784 int8).
        #[arg(long, requires = "labels")]
        image_file: Option<PathBuf>,
        /// Label blob (N bytes).
        #[arg(long, requires = "image_file")]
        labels: Option<PathBuf>,
    },
    /// Round-trip a counting pattern through DDR with the DMA engine.
    DmaLoopback {
        /// Transfer length in 32-bit words.
        #[arg(long, default_value_t = 1024)]
        words: u32,
    },
    /// Print the MMIO register map and the fixed DDR regions.
    Regs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Classify {
            hw,
            images,
            shift,
            seed,
            weights,
            image_file,
            labels,
        } => {
            let strategy = if hw {
                ConvStrategy::Hardware
            } else {
                ConvStrategy::Software
            };
            let source = match (image_file, labels) {
                (Some(i), Some(l)) => Source::Files(i, l),
                _ => Source::Synthetic(seed),
            };
            cmd_classify(strategy, images, shift, weights, source, seed)?;
        }
        Cmd::DmaLoopback { words } => cmd_dma_loopback(words)?,
        Cmd::Regs => cmd_regs(),
    }

    Ok(())
}

enum Source {
    Files(PathBuf, PathBuf),
    Synthetic(u64),
}

fn cmd_classify(
    strategy: ConvStrategy,
    images: usize,
    shift: u32,
    weights: Option<PathBuf>,
    source: Source,
    seed: u64,
) -> Result<()> {
    let weights = match weights {
        Some(path) => LenetWeights::from_file(path)?,
        None => LenetWeights::synthetic(seed),
    };
    let dataset = match source {
        Source::Files(images, labels) => Dataset::from_files(images, labels)?,
        Source::Synthetic(seed) => Dataset::synthetic(seed.wrapping_add(1), images, &weights, shift)?,
    };
    if images > dataset.len() {
        bail!("asked for {images} images, dataset holds {}", dataset.len());
    }

    let mut soc = VirtualSoc::new(SocConfig::default())?;
    weights.stage(soc.ddr_mut())?;
    dataset.stage(soc.ddr_mut())?;

    info!("Classifying {images} images, {strategy:?} convolution, shift {shift}");
    let config = InferenceConfig::default()
        .with_strategy(strategy)
        .with_shift(shift)
        .with_image_count(images);
    let summary = Classifier::new(&mut soc, config)?.run();

    for r in &summary.records {
        println!("Prediction: {}, Groundtruth: {}", r.predicted, r.expected);
        if !r.is_correct() {
            println!("Mispredicted!");
        }
    }
    println!();
    println!("Strategy                       : {strategy:?}");
    println!("Cycle Count                    : {}", summary.cycles);
    println!("Instruction Count              : {}", summary.instructions);
    println!("Number of test images          : {}", summary.images());
    println!("Number of correct predictions  : {}", summary.correct);
    Ok(())
}

fn cmd_dma_loopback(words: u32) -> Result<()> {
    let mut soc = VirtualSoc::new(SocConfig::default())?;
    let m = measure(&mut soc, |p| dma::loopback(p, words, SPILL_A_DDR_ADDR));
    let mismatches = m.result?;

    println!("DMA loopback of {words} words via {SPILL_A_DDR_ADDR:#010x}");
    println!("  cycles       : {}", m.cycles);
    println!("  instructions : {}", m.instructions);
    println!("  mismatches   : {mismatches}");
    if mismatches != 0 {
        bail!("{mismatches} bytes differ after loopback");
    }
    Ok(())
}

fn cmd_regs() {
    println!("MMIO registers");
    for addr in regs::ALL {
        println!("  {addr:#010x}  {}", regs::name(addr).unwrap_or("?"));
    }
    println!();
    println!("DDR regions ({} MiB)", DDR_BYTES / (1024 * 1024));
    for region in Region::ALL {
        println!(
            "  {:#010x}  {:<9} {:>8} bytes",
            region.base(),
            region.name(),
            region.capacity()
        );
    }
}
