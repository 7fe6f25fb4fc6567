//! bench_hw_sw_parity — accelerator vs core convolution on the same batch
//!
//! Classifies one synthetic batch twice on fresh virtual SoCs, once with the
//! convolutions on the core and once on the conv accelerator, and reports:
//!   1. Classification agreement, image by image
//!   2. Accuracy against the host reference labels
//!   3. Modeled cycles and instructions per image
//!   4. Device activity (DMA words, accelerator MACs, status polls)
//!
//! Usage:
//!   cargo run --bin bench_hw_sw_parity
//!   cargo run --bin bench_hw_sw_parity -- --images 64 --seed 7 --shift 9

use anyhow::{ensure, Result};
use lenet_driver::{SocConfig, SocStats, VirtualSoc};
use lenet_model::{Classifier, ConvStrategy, Dataset, InferenceConfig, LenetWeights, RunSummary};
use lenet_soc::network::RESCALE_SHIFT;
use tracing_subscriber::EnvFilter;

const DEFAULT_IMAGES: usize = 32;
const DEFAULT_SEED: u64 = 0x5eed;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let images = parse_arg(&args, "--images", DEFAULT_IMAGES);
    let seed = parse_arg(&args, "--seed", DEFAULT_SEED);
    let shift = parse_arg(&args, "--shift", RESCALE_SHIFT);

    println!("LeNet hw/sw parity");
    println!("==================");
    println!("Images : {images}");
    println!("Seed   : {seed:#x}");
    println!("Shift  : {shift}");
    println!();

    let weights = LenetWeights::synthetic(seed);
    let dataset = Dataset::synthetic(seed.wrapping_add(1), images, &weights, shift)?;

    let (sw, sw_stats) = run(&weights, &dataset, ConvStrategy::Software, shift)?;
    let (hw, hw_stats) = run(&weights, &dataset, ConvStrategy::Hardware, shift)?;

    let agree = sw
        .records
        .iter()
        .zip(&hw.records)
        .filter(|(s, h)| s.predicted == h.predicted)
        .count();

    println!("── Classification ──────────────────────────────────────────");
    println!("  {:<10} {:>8} {:>10}", "strategy", "correct", "accuracy");
    print_accuracy("software", &sw);
    print_accuracy("hardware", &hw);
    println!("  agreement: {agree}/{images}");
    println!();

    println!("── Timing (modeled) ────────────────────────────────────────");
    println!("  {:<10} {:>14} {:>14}", "strategy", "cycles/img", "instr/img");
    print_timing("software", &sw);
    print_timing("hardware", &hw);
    if hw.cycles > 0 {
        println!("  speedup: {:.1}×", sw.cycles as f64 / hw.cycles as f64);
    }
    println!();

    println!("── Device activity ─────────────────────────────────────────");
    print_stats("software", &sw_stats);
    print_stats("hardware", &hw_stats);

    ensure!(agree == images, "strategies disagree on {} images", images - agree);
    Ok(())
}

fn run(
    weights: &LenetWeights,
    dataset: &Dataset,
    strategy: ConvStrategy,
    shift: u32,
) -> Result<(RunSummary, SocStats)> {
    let mut soc = VirtualSoc::new(SocConfig::default())?;
    weights.stage(soc.ddr_mut())?;
    dataset.stage(soc.ddr_mut())?;
    let config = InferenceConfig::default()
        .with_strategy(strategy)
        .with_shift(shift)
        .with_image_count(dataset.len());
    let summary = Classifier::new(&mut soc, config)?.run();
    Ok((summary, soc.stats()))
}

fn print_accuracy(name: &str, s: &RunSummary) {
    println!(
        "  {:<10} {:>8} {:>9.1}%",
        name,
        s.correct,
        s.accuracy() * 100.0
    );
}

fn print_timing(name: &str, s: &RunSummary) {
    let n = s.images().max(1) as u64;
    println!(
        "  {:<10} {:>14} {:>14}",
        name,
        s.cycles / n,
        s.instructions / n
    );
}

fn print_stats(name: &str, st: &SocStats) {
    println!(
        "  {:<10} dma {:>5} jobs / {:>8} words   accel {:>3} jobs / {:>10} MACs   polls {:>8}",
        name, st.dma_jobs, st.dma_words, st.accel_jobs, st.accel_macs, st.status_polls
    );
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
