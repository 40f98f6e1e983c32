// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCP4725 12-bit I2C DAC.
//!
//! The spindle drive takes its speed reference from the DAC output. Two commands are used:
//!
//! - Fast write (volatile DAC register only). The upper nibble of the first byte carries the
//!   fast-mode and power-down bits, which are kept at zero. The device wants the two-byte pair
//!   repeated, so every command is four bytes.
//! - Write DAC register and EEPROM, used once per board to pin the power-up output.

use embedded_hal::i2c::I2c;

use crate::error::{Error, Result};

/// Highest valid DAC code.
pub const MAX_CODE: u16 = 4095;

/// Number of addressable codes (12 bits).
pub const CODES: i32 = 1 << 12;

// C2..C0 = 011: write DAC register and EEPROM
const CMD_WRITE_DAC_EEPROM: u8 = 0x60;

/// Encode a voltage code into a fast-write command.
///
/// Fails with [`Error::Range`] when `voltage` is outside `0..=4095`.
pub fn encode(voltage: i32) -> Result<[u8; 4]> {
    if !(0..CODES).contains(&voltage) {
        return Err(Error::Range(voltage));
    }

    let high = (0x0F & (voltage >> 8)) as u8;
    let low = (0xFF & voltage) as u8;

    Ok([high, low, high, low])
}

/// Encode a "write DAC register and EEPROM" command. The 12-bit value is left-aligned.
pub fn encode_power_on_default(voltage: i32) -> Result<[u8; 3]> {
    if !(0..CODES).contains(&voltage) {
        return Err(Error::Range(voltage));
    }

    Ok([
        CMD_WRITE_DAC_EEPROM,
        (voltage >> 4) as u8,
        ((voltage & 0x0F) << 4) as u8,
    ])
}

/// MCP4725 bound to one bus address.
pub struct Mcp4725<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp4725<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Send a raw four-byte command.
    pub fn write_command(&mut self, command: &[u8; 4]) -> Result<()> {
        self.i2c.write(self.address, command).map_err(Error::bus)
    }

    /// Set the volatile output to `voltage`.
    pub fn write_voltage(&mut self, voltage: u16) -> Result<()> {
        let command = encode(voltage as i32)?;
        self.write_command(&command)
    }

    /// Set the output and store it as the power-up default.
    ///
    /// Only needed once per device; the EEPROM has limited write endurance.
    pub fn write_power_on_default(&mut self, voltage: u16) -> Result<()> {
        let command = encode_power_on_default(voltage as i32)?;
        self.i2c.write(self.address, &command).map_err(Error::bus)
    }
}
