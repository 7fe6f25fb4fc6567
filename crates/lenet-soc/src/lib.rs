//! Silicon model of the LeNet SoC: a small in-order core with local data
//! memory, a DW-style DMA engine to external DDR, and a fixed-function
//! 3-D convolution accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**. It is the
//! hardware contract shared by the driver and the inference pipeline:
//! register addresses, status bits, where the init program stages weights,
//! images and labels in DDR, and the LeNet layer geometry those buffers are
//! sized for.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | MMIO register map: counters, accelerator, DMA, status bits |
//! | [`memmap`] | External-memory (DDR) layout and accelerator spill areas |
//! | [`network`] | LeNet layer dimensions and buffer sizes |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod memmap;
pub mod network;
pub mod regs;
