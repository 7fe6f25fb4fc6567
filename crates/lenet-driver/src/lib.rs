//! Device protocol for the LeNet SoC.
//!
//! The core drives two peripherals through memory-mapped registers: a DMA
//! engine that moves 32-bit words between external DDR and its local DMem,
//! and a conv accelerator that runs a whole convolution layer over DDR.
//! Both follow the same discipline: program the parameters, write `START`,
//! spin on `STATUS` until `DONE`.
//!
//! # Layers
//!
//! ```text
//! dma / accel / counters   protocol, generic over RegisterBus
//!          │
//! bus::Platform            RegisterBus + local DMem + op accounting
//!          │
//! backends::VirtualSoc     simulated board (DDR, DMem, devices, counters)
//! ```
//!
//! # Quick start
//!
//! ```
//! use lenet_driver::{dma, Platform, SocConfig, VirtualSoc};
//! use lenet_driver::memory::LocalRegion;
//!
//! # fn main() -> Result<(), lenet_driver::SocError> {
//! let mut soc = VirtualSoc::new(SocConfig::default())?;
//! soc.ddr_mut().write(0x0090_0000, &[1, 2, 3, 4, 5, 6, 7, 8])?;
//! dma::load_block(&mut soc, 0x0090_0000, 0, 2);
//! assert_eq!(soc.local().bytes(LocalRegion::new(0, 2)), &[1, 2, 3, 4, 5, 6, 7, 8]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod accel;
pub mod backends;
mod bus;
mod config;
pub mod counters;
pub mod dma;
mod error;
pub mod memory;

pub use accel::{run_accelerator, AcceleratorJob};
pub use backends::{SocStats, VirtualSoc};
pub use bus::{Platform, RegisterBus};
pub use config::{CostModel, SocConfig};
pub use counters::{measure, Measurement};
pub use dma::{load_block, store_block, DmaDirection, DmaJob};
pub use error::{Result, SocError};
pub use memory::{ExternalMemory, LocalMemory, LocalRegion, LocalView};
