// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Logical output line on top of a raw GPIO pin.
//!
//! Board wiring decides whether "asserted" means a high or a low level. `OutputLine` hides that
//! polarity from the drivers above it and remembers the last level it drove.

use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};

/// Whether the line is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// Output line that remembers its active level and last driven state.
pub struct OutputLine<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    asserted: bool,
}

impl<PIN: OutputPin> OutputLine<PIN> {
    /// Wrap a pin and drive it to the inactive level.
    pub fn new(pin: PIN, active: ActiveLevel) -> Result<Self> {
        let mut line = Self {
            pin,
            active,
            asserted: true,
        };
        line.set(false)?;
        Ok(line)
    }

    pub fn active_high(pin: PIN) -> Result<Self> {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Result<Self> {
        Self::new(pin, ActiveLevel::Low)
    }

    /// Drive the line logically asserted (true) or released (false).
    ///
    /// The cached state only changes once the pin accepted the new level.
    pub fn set(&mut self, asserted: bool) -> Result<()> {
        match (self.active, asserted) {
            (ActiveLevel::High, true) | (ActiveLevel::Low, false) => self.pin.set_high(),
            (ActiveLevel::High, false) | (ActiveLevel::Low, true) => self.pin.set_low(),
        }
        .map_err(Error::pin)?;
        self.asserted = asserted;
        Ok(())
    }

    #[inline]
    pub fn assert(&mut self) -> Result<()> {
        self.set(true)
    }

    #[inline]
    pub fn deassert(&mut self) -> Result<()> {
        self.set(false)
    }

    #[inline]
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}
