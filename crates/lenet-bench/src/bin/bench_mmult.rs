//! Matrix multiply timing — 64×64 i32 matmul with the core's shift-add
//! multiplier, timed with the cycle and instruction counters.
//!
//! A is the identity and `B[i][j] = j`, so the sum of the product matrix is
//! known in closed form and checked.
//!
//! Usage:
//!   cargo run --bin bench_mmult
//!   cargo run --bin bench_mmult -- --log2-dim 5

use anyhow::{ensure, Result};
use lenet_driver::{measure, Platform, SocConfig, VirtualSoc};
use lenet_model::fixed::multiply;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG2_DIM: usize = 6;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let log2_dim = parse_arg(&args, "--log2-dim", DEFAULT_LOG2_DIM).min(8);
    let dim = 1usize << log2_dim;

    let (a, b) = generate_matrices(dim);
    let mut s = vec![0i32; dim * dim];

    let mut soc = VirtualSoc::new(SocConfig::default())?;
    let m = measure(&mut soc, |p| mmult(p, dim, &a, &b, &mut s));

    // Σ_i Σ_j j
    let expected = (dim * dim * (dim - 1) / 2) as u32;
    println!("Matrix multiply {dim}×{dim}");
    println!("=====================");
    println!("  Result       : {:#x}", m.result);
    println!("  Cycles       : {:#x} ({})", m.cycles, m.cycles);
    println!("  Instructions : {:#x} ({})", m.instructions, m.instructions);
    if m.instructions > 0 {
        println!("  CPI          : {:.2}", f64::from(m.cycles) / f64::from(m.instructions));
    }
    ensure!(
        m.result == expected,
        "checksum {:#x}, expected {:#x}",
        m.result,
        expected
    );
    Ok(())
}

fn generate_matrices(dim: usize) -> (Vec<i32>, Vec<i32>) {
    let mut a = vec![0i32; dim * dim];
    let mut b = vec![0i32; dim * dim];
    for i in 0..dim {
        for j in 0..dim {
            a[i * dim + j] = i32::from(i == j);
            b[i * dim + j] = j as i32;
        }
    }
    (a, b)
}

/// `S = A·B`, returning the wrapping sum of `S`. Retires one op per
/// multiply-accumulate.
fn mmult<P: Platform>(p: &mut P, dim: usize, a: &[i32], b: &[i32], s: &mut [i32]) -> u32 {
    let mut sum = 0i32;
    for i in 0..dim {
        for j in 0..dim {
            let mut acc = 0i32;
            for k in 0..dim {
                acc = acc.wrapping_add(multiply(a[i * dim + k], b[k * dim + j]));
            }
            s[i * dim + j] = acc;
            sum = sum.wrapping_add(acc);
        }
        p.retire((dim * dim) as u64);
    }
    sum as u32
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
