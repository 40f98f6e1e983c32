// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LED.
//!
//! The service lights it once the controller is up and turns it off on shutdown.

use embedded_hal::digital::OutputPin;

use crate::error::Result;
use crate::hw::line::{ActiveLevel, OutputLine};

pub struct Led<PIN: OutputPin> {
    line: OutputLine<PIN>,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new(pin: PIN, active: ActiveLevel) -> Result<Self> {
        Ok(Self {
            line: OutputLine::new(pin, active)?,
        })
    }

    pub fn active_low(pin: PIN) -> Result<Self> {
        Self::new(pin, ActiveLevel::Low)
    }

    #[inline]
    pub fn on(&mut self) -> Result<()> {
        self.line.assert()
    }

    #[inline]
    pub fn off(&mut self) -> Result<()> {
        self.line.deassert()
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.line.is_asserted()
    }
}
