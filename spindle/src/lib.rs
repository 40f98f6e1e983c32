// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Spindle Controller
//!
//! This crate drives the spindle of a CNC milling machine from a Raspberry Pi: a 12-bit I2C DAC
//! sets the motor drive's speed reference, a GPIO line gates the motor power supply, and a small
//! REST surface lets the machine controller command speed and emergency stop.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Pin wrappers and `rppal` board bring-up |
//! | [`drivers`] | Device-level drivers (MCP4725 DAC, PSU enable) |
//! | [`control`] | Spindle state, stepped ramp and the controller façade |
//! | [`protocol`] | JSON messages and REST routing |
//! | [`config`] | Service configuration |
//! | [`service`] | Controller plus status LED lifecycle |
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Run on the Pi:
//!
//! ```bash
//! RUST_LOG=debug cargo run --release -- --ramp-delay-us 250
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//!
//! © 2025–2026 Christopher Liu

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod hw;
pub mod protocol;
pub mod service;

pub use config::Config;
pub use error::{Error, Result};
