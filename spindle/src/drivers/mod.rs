// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! control logic.
//!
//! ## Existing drivers
//!
//! - [`mcp4725`] – Microchip MCP4725 12-bit I2C DAC (spindle speed reference)
//! - [`psu`] – Motor power-supply enable line

pub mod mcp4725;
pub mod psu;

pub use mcp4725::Mcp4725;
pub use psu::PsuGate;
