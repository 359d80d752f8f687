// SPDX-License-Identifier: MIT

//! # flapdrive
//!
//! Controller for split-flap displays built from open-loop stepper units and
//! daisy-chained 74HC595 shift registers. The crate owns the per-unit homing
//! and motion state machines and the chain-wide output frame; the caller owns
//! the step clock and the board bring-up.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Hardware seams the controller drives ([`FrameBus`], [`HomeSense`]) |
//! | [`drivers`] | 74HC595 chain drivers over hardware SPI or bit-banged GPIO |
//! | [`control`] | Unit calibration, motion state machines, display aggregation |
//!
//! ## Getting Started
//!
//! Wire a bus and a sensor read into a [`Display`], add units, and call
//! [`Display::step`] once per step period:
//!
//! ```rust,no_run
//! use flapdrive::drivers::BitBang595;
//! use flapdrive::{ActiveLevel, Direction, Display, Edge, UnitConfig};
//!
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = core::convert::Infallible; }
//! # impl embedded_hal::digital::OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # let data = MockPin;
//! # let clock = MockPin;
//! # let latch = MockPin;
//! # fn read_hall(_unit: usize) -> u8 { 0 }
//! let bus = BitBang595::new(data, clock, latch);
//! let mut display = Display::new(bus, read_hall);
//!
//! let unit = match display.add_unit(UnitConfig {
//!     motor_level: ActiveLevel::High,
//!     home_edge: Edge::Rising,
//!     direction: Direction::Forward,
//!     sensor_threshold: 128,
//!     flaps: 40,
//!     steps: 2048,
//!     home_offset: 37,
//!     home_tolerance: 2,
//! }) {
//!     Ok(unit) => unit,
//!     Err(_) => return,
//! };
//!
//! if display.set_flap(unit, 12).is_err() {
//!     return;
//! }
//!
//! // Units home on their first move, then settle on the target flap.
//! loop {
//!     match display.step() {
//!         Ok(true) => break,
//!         Ok(false) => {}
//!         Err(_) => return,
//!     }
//! }
//! ```
//!
//! ## Cargo Features
//!
//! - `defmt` – derive `defmt::Format` on the public types
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod control;
pub mod drivers;
pub mod error;
pub mod hw;

pub use control::{
    ActiveLevel, Direction, Display, Edge, OutputLine, UnitConfig, UnitStatus, MAX_UNITS,
};
pub use error::{CalibrationError, Error};
pub use hw::{FrameBus, HomeSense};
