// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Service lifecycle.
//!
//! Pairs the spindle controller with the status LED: the LED is lit while the controller accepts
//! requests and goes dark on the way out, whether or not the controller closed cleanly.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::control::SpindleController;
use crate::drivers::{Mcp4725, PsuGate};
use crate::error::Result;
use crate::hw::Led;

pub struct Service<I2C, P, L>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
    L: OutputPin,
{
    controller: SpindleController<I2C, P>,
    status_led: Option<Led<L>>,
}

impl<I2C, P, L> Service<I2C, P, L>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
    L: OutputPin,
{
    /// Light the status LED over an open controller.
    pub fn start(
        controller: SpindleController<I2C, P>,
        mut status_led: Option<Led<L>>,
    ) -> Result<Self> {
        if let Some(led) = status_led.as_mut() {
            led.on()?;
        }
        info!("spindle service up");
        Ok(Self {
            controller,
            status_led,
        })
    }

    #[inline]
    pub fn controller(&self) -> &SpindleController<I2C, P> {
        &self.controller
    }

    /// Close the controller, then turn the LED off.
    ///
    /// The LED is turned off even when closing fails; the close error takes precedence.
    pub fn stop(self) -> Result<(Mcp4725<I2C>, PsuGate<P>)> {
        let Self {
            controller,
            mut status_led,
        } = self;

        let closed = controller.close();
        let dark = match status_led.as_mut() {
            Some(led) => led.off(),
            None => Ok(()),
        };

        let hardware = closed?;
        if let Err(err) = dark {
            warn!("could not turn status LED off: {}", err);
            return Err(err);
        }
        info!("spindle service down");
        Ok(hardware)
    }
}
