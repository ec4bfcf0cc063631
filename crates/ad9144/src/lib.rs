//! AD9144 JESD204B transmit-link driver
//!
//! Brings up the link between a JESD204B transmitter (FPGA) and the AD9144
//! quad DAC: link parameter negotiation, SERDES and DAC clock PLLs, the
//! transport layer, SYSREF/SYNC~ alignment, the NCO and the lane health
//! check.
//!
//! # Architecture
//!
//! ```text
//! orchestrator ──▶ platform::LinkCallbacks (link.rs)
//!                    ├─ link_config  negotiate L/M/F/K/S, lane rate, ILAS
//!                    ├─ serdes_pll   VCO + CDR presets, lock poll
//!                    ├─ dac_pll      divider math, VCO band, lock poll
//!                    ├─ nco          mode select, 48-bit FTW, phase
//!                    └─ health       CGS / FS / ILS lane flags
//!                         ↓
//!                  device.rs  register helpers, bounded polling
//!                         ↓
//!                  platform::RegisterBus (SPI: R/W + 15-bit address)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use ad9144::{Ad9144, Ad9144Config};
//! use platform::{bring_up, JesdLink, RegisterBus};
//! use embedded_hal::delay::DelayNs;
//!
//! fn start<B: RegisterBus, D: DelayNs>(bus: B, delay: D) -> Result<(), ad9144::Error<B::Error>> {
//!     let mut dac = Ad9144::new(bus, delay, Ad9144Config::fmcdaq2())?;
//!     dac.probe()?;
//!     let mut link = JesdLink::default();
//!     bring_up(&mut dac, &mut link).map_err(|failure| failure.error)?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls
//! - `defmt`: defmt logging and `defmt::Format` on public types
//! - `tracing`: tracing logging (host builds)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dac_pll;
pub mod device;
pub mod error;
pub mod health;
pub mod link;
pub mod link_config;
pub mod nco;
pub mod registers;
pub mod serdes_pll;
pub mod status;
pub mod test_modes;

pub use config::{
    Ad9144Config, BoardLink, DacPllSettings, DataFormat, Interpolation, LockPollConfig,
    NcoSettings, SysrefEdge,
};
pub use dac_pll::PllConfig;
pub use device::{Ad9144, ChipInfo, LockOutcome};
pub use error::{ArgumentError, Error, Fault, Pll, TimeoutKind};
pub use health::HealthStatus;
pub use link_config::{LinkConfig, SyncPulseWidth};
pub use nco::{NcoConfig, NcoMode};
pub use serdes_pll::SerdesPllConfig;
pub use status::StatusReport;
pub use test_modes::{PrbsPattern, PrbsReport};
