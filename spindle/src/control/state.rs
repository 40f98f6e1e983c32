// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Spindle state and the lock that guards it.
//!
//! The ramp worker, the emergency-stop path and the request layer all go through one mutex
//! holding [`SpindleState`] together with the PSU gate. That makes the emergency-stop flag check
//! in the ramp loop linearizable with its assertion, and keeps status snapshots consistent.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use crate::drivers::mcp4725::MAX_CODE;
use crate::drivers::PsuGate;
use crate::error::{Error, Result};

/// Mutable state of one spindle.
#[derive(Clone, Debug, PartialEq)]
pub struct SpindleState {
    /// Last DAC code reached by the ramp, always within `0..=4095`.
    pub current_voltage: u16,
    /// Last accepted setpoint.
    pub current_setpoint_rpm: f64,
    /// Speed assumed reached once the last ramp completed.
    pub current_rpm: f64,
    /// True while a ramp is accepted or executing.
    pub ramping: bool,
    /// Pause between two DAC codes.
    pub ramp_delay: Duration,
    /// RPM to DAC code conversion constant.
    pub scale_factor: f64,
    pub emergency_stop_active: bool,
}

impl SpindleState {
    /// Fail-safe initial state: output at zero, emergency stop asserted.
    pub fn new(ramp_delay: Duration, scale_factor: f64) -> Self {
        Self {
            current_voltage: 0,
            current_setpoint_rpm: 0.0,
            current_rpm: 0.0,
            ramping: false,
            ramp_delay,
            scale_factor,
            emergency_stop_active: true,
        }
    }

    /// DAC code for `rpm`, rounded and clamped into `0..=4095`.
    pub fn voltage_for(&self, rpm: f64) -> u16 {
        let code = (rpm * self.scale_factor).round();
        if code.is_nan() {
            return 0;
        }
        code.clamp(0.0, MAX_CODE as f64) as u16
    }
}

/// Consistent copy of the fields the outside world may look at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpindleSnapshot {
    pub ramping: bool,
    pub current_setpoint_rpm: f64,
    pub current_rpm: f64,
    pub current_voltage: u16,
    pub emergency_stop_active: bool,
    pub psu_enabled: bool,
}

/// State plus PSU gate, behind one lock.
pub(crate) struct Shared<P: OutputPin> {
    pub state: SpindleState,
    /// `None` once the controller has been closed.
    pub psu: Option<PsuGate<P>>,
}

impl<P: OutputPin> Shared<P> {
    pub fn new(state: SpindleState, psu: PsuGate<P>) -> Self {
        Self {
            state,
            psu: Some(psu),
        }
    }

    /// Raise the emergency-stop flag and cut the PSU.
    ///
    /// The flag is set even when the line cannot be driven; the error is still returned.
    pub fn assert_emergency_stop(&mut self) -> Result<()> {
        if !self.state.emergency_stop_active {
            debug!("emergency stop asserted at code {}", self.state.current_voltage);
        }
        self.state.emergency_stop_active = true;

        let psu = self.psu.as_mut().ok_or(Error::Closed)?;
        psu.disable().map_err(|err| {
            error!("could not disable PSU on emergency stop: {}", err);
            err
        })
    }

    pub fn snapshot(&self) -> SpindleSnapshot {
        SpindleSnapshot {
            ramping: self.state.ramping,
            current_setpoint_rpm: self.state.current_setpoint_rpm,
            current_rpm: self.state.current_rpm,
            current_voltage: self.state.current_voltage,
            emergency_stop_active: self.state.emergency_stop_active,
            psu_enabled: self.psu.as_ref().map_or(false, |psu| psu.is_enabled()),
        }
    }
}

/// Take the lock even if a previous holder panicked; the emergency stop must always get through.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
