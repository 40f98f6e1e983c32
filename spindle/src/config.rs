// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Service configuration.
//!
//! Every field has a default matching the reference board, so an empty JSON object (or no file at
//! all) is a valid configuration. Example:
//!
//! ```json
//! {
//!     "device": "/dev/i2c-1",
//!     "address": 98,
//!     "psu_enable_pin": 21,
//!     "ramp_delay_us": 250,
//!     "write_policy": "fail-fast"
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::{ControllerConfig, WritePolicy};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// I2C character device the DAC sits on.
    pub device: String,
    /// 7-bit DAC bus address.
    pub address: u8,
    /// GPIO driving the DAC's A0 address bit (held low).
    pub address_select_pin: u8,
    /// GPIO driving the active-low PSU enable input.
    pub psu_enable_pin: u8,
    /// GPIO driving the active-low status LED, if fitted.
    pub status_led_pin: Option<u8>,
    /// Pause between two DAC codes, in microseconds.
    pub ramp_delay_us: u64,
    /// RPM to DAC code conversion constant.
    pub scale_factor: f64,
    pub write_policy: WritePolicy,
    /// HTTP listen address.
    pub listen: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: "/dev/i2c-1".to_string(),
            address: 0x62,
            address_select_pin: 4,
            psu_enable_pin: 21,
            status_led_pin: Some(22),
            ramp_delay_us: 0,
            scale_factor: 0.4,
            write_policy: WritePolicy::BestEffort,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), err)))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale_factor.is_finite() || self.scale_factor < 0.0 {
            return Err(Error::Config(format!(
                "scale factor must be finite and non-negative, got {}",
                self.scale_factor
            )));
        }
        if self.address > 0x7F {
            return Err(Error::Config(format!(
                "address {:#x} does not fit in 7 bits",
                self.address
            )));
        }
        if self.listen.is_empty() {
            return Err(Error::Config("listen address is empty".to_string()));
        }
        self.i2c_bus()?;
        Ok(())
    }

    /// Bus number from a `/dev/i2c-N` device path.
    pub fn i2c_bus(&self) -> Result<u8> {
        self.device
            .rsplit_once("i2c-")
            .and_then(|(_, bus)| bus.parse().ok())
            .ok_or_else(|| {
                Error::Config(format!("`{}` is not an I2C bus device", self.device))
            })
    }

    pub fn ramp_delay(&self) -> Duration {
        Duration::from_micros(self.ramp_delay_us)
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            ramp_delay: self.ramp_delay(),
            scale_factor: self.scale_factor,
            write_policy: self.write_policy,
        }
    }
}
