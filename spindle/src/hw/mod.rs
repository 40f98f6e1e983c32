// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Board-Level Wrappers
//!
//! Thin wrappers around GPIO lines plus the Raspberry Pi bring-up that acquires the bus and pins.
//!
//! - [`line`] - Polarity-aware output line.
//! - [`led`] - Status LED.
//! - [`rpi`] - `rppal` bring-up of the I2C bus and GPIO lines.

pub mod led;
pub mod line;
pub mod rpi;

#[cfg(test)]
pub(crate) mod mock;

pub use led::Led;
pub use line::{ActiveLevel, OutputLine};
