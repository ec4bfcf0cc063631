//! Hardware abstraction layer for JESD204 converter drivers
//!
//! This crate holds the contracts a converter driver is written against,
//! so that device crates can be exercised without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Board / orchestrator (owns the link, drives the states)
//!         ↓
//! Device driver (ad9144 crate - implements LinkCallbacks)
//!         ↓
//! Platform HAL (this crate - transport + orchestrator contract)
//!         ↓
//! embedded-hal SpiDevice / DelayNs
//! ```
//!
//! # Contents
//!
//! - [`peripheral`] - [`RegisterBus`] transport and the SPI framing adapter
//! - [`jesd204`] - link states, callback trait and single-link sequencing
//! - [`converter_types`] - validated clock and phase newtypes
//! - [`mocks`] - recording bus and delay for host tests (`std` feature)
//!
//! # Features
//!
//! - `std`: Enable standard library support (mocks, `std::error::Error`)
//! - `defmt`: Enable defmt formatting of all public types
//!
//! # Example
//!
//! ```no_run
//! use platform::RegisterBus;
//!
//! fn product_id<B: RegisterBus>(bus: &mut B) -> Result<u8, B::Error> {
//!     bus.read_reg(0x004)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod converter_types;
pub mod jesd204;
pub mod mocks;
pub mod peripheral;

pub use converter_types::{DacClockKhz, OutOfRangeError, PhaseDegrees, RefClockKhz};
pub use jesd204::{
    bring_up, tear_down, JesdLink, LinkCallbacks, LinkReason, LinkState, Subclass, SysrefMode,
};
pub use peripheral::{Opcode, RegisterBus, SpiRegisterBus, SpiRegisterBusError};
