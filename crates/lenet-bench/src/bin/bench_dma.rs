//! DMA loopback benchmark — DMem → DDR → DMem on the virtual SoC.
//!
//! Stores a counting pattern from DMem to the accelerator spill area, loads
//! it back into a second DMem buffer, checks every byte and reports the
//! modeled cycle cost of the round trip.
//!
//! Usage:
//!   cargo run --bin bench_dma
//!   cargo run --bin bench_dma -- --words 4096 --iterations 50

use anyhow::{bail, Result};
use lenet_driver::{dma, measure, SocConfig, VirtualSoc};
use lenet_soc::memmap::SPILL_A_DDR_ADDR;
use tracing_subscriber::EnvFilter;

const DEFAULT_WORDS: usize = 1024;
const DEFAULT_ITERATIONS: usize = 20;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let words = parse_arg(&args, "--words", DEFAULT_WORDS);
    let iterations = parse_arg(&args, "--iterations", DEFAULT_ITERATIONS);
    let words_u32 = u32::try_from(words)?;

    println!("DMA loopback benchmark");
    println!("======================");
    println!("Transfer size : {} words ({} bytes)", words, words * 4);
    println!("Iterations    : {}", iterations);
    println!();

    let mut soc = VirtualSoc::new(SocConfig::default())?;

    let mut total_cycles = 0u64;
    let mut total_instructions = 0u64;
    for _ in 0..iterations {
        let m = measure(&mut soc, |s| dma::loopback(s, words_u32, SPILL_A_DDR_ADDR));
        let mismatches = m.result?;
        if mismatches != 0 {
            bail!("loopback corrupted {mismatches} bytes");
        }
        total_cycles += u64::from(m.cycles);
        total_instructions += u64::from(m.instructions);
    }

    let stats = soc.stats();
    let moved = (2 * words * iterations) as f64;
    println!("Results");
    println!("-------");
    println!("  DMA jobs          : {}", stats.dma_jobs);
    println!("  Words moved       : {}", stats.dma_words);
    println!("  Status polls      : {}", stats.status_polls);
    println!("  Cycles / loopback : {}", total_cycles / iterations.max(1) as u64);
    println!("  Instr. / loopback : {}", total_instructions / iterations.max(1) as u64);
    if moved > 0.0 {
        println!("  Cycles / word     : {:.2}", total_cycles as f64 / moved);
    }
    println!();
    println!("Round trip verified: 0 mismatches");
    Ok(())
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
