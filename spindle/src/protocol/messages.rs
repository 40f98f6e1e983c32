// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! JSON bodies exchanged with the machine controller.

use serde::{Deserialize, Serialize};

use crate::control::{RampRequest, SpindleSnapshot};
use crate::error::Error;

/// Body of `GET /spindle`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpindleStatus {
    /// False once the spindle is at speed.
    pub ramping: bool,
    #[serde(rename = "currentsetpoint")]
    pub current_setpoint: f64,
    #[serde(rename = "currentrpm")]
    pub current_rpm: f64,
}

impl From<SpindleSnapshot> for SpindleStatus {
    fn from(snapshot: SpindleSnapshot) -> Self {
        Self {
            ramping: snapshot.ramping,
            current_setpoint: snapshot.current_setpoint_rpm,
            current_rpm: snapshot.current_rpm,
        }
    }
}

/// Body of `POST /spindle`. `setpoint` may be left out when disabling.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpindleCommand {
    pub enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint: Option<f64>,
}

impl TryFrom<SpindleCommand> for RampRequest {
    type Error = Error;

    fn try_from(command: SpindleCommand) -> Result<Self, Error> {
        match (command.enable, command.setpoint) {
            (false, _) => Ok(RampRequest::stop()),
            (true, Some(rpm)) => Ok(RampRequest::run(rpm)),
            (true, None) => Err(Error::MissingSetpoint),
        }
    }
}
