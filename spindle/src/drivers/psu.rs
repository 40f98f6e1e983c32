// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motor power-supply enable line.
//!
//! The gate holds no opinion about whether the supply *should* be on; the spindle controller is
//! the source of truth and drives the gate. On the reference board the enable input is
//! active-low, so "enable" pulls the line low.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::Result;
use crate::hw::{ActiveLevel, OutputLine};

pub struct PsuGate<PIN: OutputPin> {
    line: OutputLine<PIN>,
}

impl<PIN: OutputPin> PsuGate<PIN> {
    /// Wrap the enable line. The supply starts disabled.
    pub fn new(pin: PIN, active: ActiveLevel) -> Result<Self> {
        Ok(Self {
            line: OutputLine::new(pin, active)?,
        })
    }

    pub fn active_low(pin: PIN) -> Result<Self> {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn enable(&mut self) -> Result<()> {
        self.line.assert()?;
        debug!("PSU enabled");
        Ok(())
    }

    /// Disable the supply. Safe to call repeatedly.
    pub fn disable(&mut self) -> Result<()> {
        self.line.deassert()?;
        debug!("PSU disabled");
        Ok(())
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.line.is_asserted()
    }

    /// Hand back the pin, left at whatever level was last driven.
    pub fn free(self) -> PIN {
        self.line.free()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hw::mock::MockPin;

    #[test]
    fn starts_disabled_with_line_high() {
        let pin = MockPin::new();
        let psu = PsuGate::active_low(pin.clone()).unwrap();
        assert!(!psu.is_enabled());
        assert_eq!(pin.level(), Some(true));
    }

    #[test]
    fn enable_drives_line_low() {
        let pin = MockPin::new();
        let mut psu = PsuGate::active_low(pin.clone()).unwrap();

        psu.enable().unwrap();
        assert!(psu.is_enabled());
        assert_eq!(pin.level(), Some(false));
    }

    #[test]
    fn disable_twice_is_fine() {
        let pin = MockPin::new();
        let mut psu = PsuGate::active_low(pin.clone()).unwrap();
        psu.enable().unwrap();

        psu.disable().unwrap();
        psu.disable().unwrap();
        assert!(!psu.is_enabled());
        assert_eq!(pin.level(), Some(true));
        // construction, enable, two disables
        assert_eq!(pin.drives(), 4);
    }

    #[test]
    fn drive_failure_is_reported() {
        let pin = MockPin::new();
        let mut psu = PsuGate::active_low(pin.clone()).unwrap();

        pin.fail(true);
        assert!(matches!(psu.enable(), Err(Error::Io(_))));
        assert!(!psu.is_enabled());
    }

    #[test]
    fn free_leaves_line_disabled() {
        let pin = MockPin::new();
        let mut psu = PsuGate::active_low(pin.clone()).unwrap();
        psu.enable().unwrap();
        psu.disable().unwrap();

        let released = psu.free();
        assert_eq!(released.level(), Some(true));
        assert_eq!(pin.drives(), 3);
    }
}
