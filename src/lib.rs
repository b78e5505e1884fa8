//! # Adder MMIO Driver
//!
//! A bare-metal driver and self-test for the "adder" peripheral, a memory-mapped
//! unit that adds two 32-bit operands.
//!
//! The crate provides:
//! - Volatile, fixed-width register access through the [`RegisterBus`] trait
//! - A typed register map where each register carries its own width
//! - [`AdderDriver`], which polls STATUS with bounded timeouts
//! - [`SelfTest`], which checks the peripheral against a software reference
//! - [`SimulatedAdder`], an instrumented register bank for host testing
//!
//! ## Features
//!
//! - `std`: Host runner binary and `StdTimer` (enabled by default)
//! - `log`: Log through the `log` crate (enabled by default)
//! - `defmt`: Log through `defmt` on target
//! - `rt`: Runtime crates for the bare-metal demo
//!
//! ## Example
//!
//! ```rust
//! use adder_mmio::{AdderConfig, AdderDriver, SelfTest, SelfTestOutcome, SimClock, SimulatedAdder};
//!
//! let adder = SimulatedAdder::new();
//! let mut driver = AdderDriver::new(&adder, SimClock::new(1), AdderConfig::new());
//!
//! let outcome = SelfTestOutcome::from_result(SelfTest::new(4, 5).run(&mut driver));
//! assert_eq!(outcome.exit_code(), 0);
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::cargo
)]

#[cfg(any(test, feature = "std"))]
extern crate std;

// Must stay first so the logging macros are in scope below
#[macro_use]
mod fmt;

pub mod hal;
pub mod regs;
pub mod sim;

// Re-export the driver and self-test types
pub use adder::{reference_sum, AdderConfig, AdderDriver, AdderError, PollStage};
pub use selftest::{SelfTest, SelfTestOutcome, SelfTestReport};

// Re-export HAL and simulation components
pub use hal::{
    bus::{RegisterBus, RegisterWidth, Width},
    mmio::{Mmio, MmioBus},
    timer::{CounterTimer, Timer},
};
#[cfg(feature = "std")]
pub use hal::timer::StdTimer;
pub use regs::AdderStatus;
pub use sim::{Access, AccessKind, BusFault, SimClock, SimulatedAdder};

mod adder;
pub mod selftest;
