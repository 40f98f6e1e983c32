// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Raspberry Pi bring-up.
//!
//! Acquires the I2C character device and the GPIO lines named in [`Config`] through `rppal` and
//! hands them to the drivers. Any acquisition failure is a [`Error::Setup`]; the controller must
//! not be built on top of a partially opened board.

use log::info;
use rppal::gpio::{Gpio, OutputPin};
use rppal::i2c::I2c;

use crate::config::Config;
use crate::drivers::{Mcp4725, PsuGate};
use crate::error::{Error, Result};
use crate::hw::Led;

/// Everything the service needs from the board.
pub struct Hardware {
    pub dac: Mcp4725<I2c>,
    pub psu: PsuGate<OutputPin>,
    pub status_led: Option<Led<OutputPin>>,

    /// Held low for the lifetime of the service so the DAC answers on A0=0.
    _address_select: OutputPin,
}

/// Open the DAC bus, the address-select line, the PSU enable line and the status LED.
///
/// The PSU line is driven to "disabled" before anything else touches the DAC.
pub fn open(config: &Config) -> Result<Hardware> {
    let gpio = Gpio::new().map_err(Error::setup)?;

    let psu_pin = gpio
        .get(config.psu_enable_pin)
        .map_err(Error::setup)?
        .into_output_high();
    let psu = PsuGate::active_low(psu_pin).map_err(Error::setup)?;

    let address_select = gpio
        .get(config.address_select_pin)
        .map_err(Error::setup)?
        .into_output_low();

    let bus = config.i2c_bus()?;
    let i2c = I2c::with_bus(bus).map_err(Error::setup)?;
    let dac = Mcp4725::new(i2c, config.address);

    let status_led = match config.status_led_pin {
        Some(pin) => {
            let pin = gpio.get(pin).map_err(Error::setup)?.into_output_high();
            Some(Led::active_low(pin).map_err(Error::setup)?)
        }
        None => None,
    };

    info!(
        "opened {} (address {:#04x}), A0 on GPIO{}, PSU enable on GPIO{}",
        config.device, config.address, config.address_select_pin, config.psu_enable_pin
    );

    Ok(Hardware {
        dac,
        psu,
        status_led,
        _address_select: address_select,
    })
}
