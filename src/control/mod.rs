// SPDX-License-Identifier: MIT

//! # Motion Control
//!
//! This module holds everything between a flap request and the output bits:
//! calibration, the per-unit state machine, and the display-wide controller.
//!
//! ## Modules
//!
//! - [`config`] - Unit configuration and derived calibration constants.
//! - [`unit`] - Per-unit homing and motion state machine.
//! - [`display`] - Controller owning the unit table, tick loop, and frame
//!   serialization.

pub mod config;
pub mod display;
pub mod unit;

pub use config::{ActiveLevel, Calibration, Direction, Edge, UnitConfig, MILLISTEPS_PER_STEP};
pub use display::{Display, FRAME_BYTES, MAX_UNITS};
pub use unit::{FlapUnit, OutputLine, UnitStatus};
