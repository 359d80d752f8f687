// SPDX-License-Identifier: MIT

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! control logic.
//!
//! ## Existing drivers
//!
//! - [`hc595`] – 74HC595 shift-register chains, over hardware SPI or bit-banged GPIO

pub mod hc595;

pub use hc595::{BitBang595, NoOe, Spi595};
