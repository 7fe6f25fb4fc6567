//! Targets implementing the register contract
//!
//! - **VirtualSoc**: host-side model of DDR, DMem, DMA engine, conv
//!   accelerator and counters (tests, benches, CLI)

mod conv_engine;
pub mod virtual_soc;

pub use virtual_soc::{SocStats, VirtualSoc};
