// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Spindle controller.
//!
//! Front door for the request layer. It owns the shared [`SpindleState`] and PSU gate, and a
//! worker thread that owns the [`RampEngine`]. Ramp requests travel to the worker through a
//! mailbox so that a request returns immediately while the ramp, which can take seconds, runs.
//!
//! Rules enforced here:
//!
//! - At most one ramp at a time. A request arriving while `ramping` is set is rejected with
//!   [`Error::Busy`] and changes nothing.
//! - Emergency stop always goes through, busy or not. It raises the flag and cuts the PSU under
//!   the state lock; a running ramp sees the flag on its next step and retracts to zero.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, error, info};

use crate::control::ramp::{RampEngine, WritePolicy};
use crate::control::state::{lock, Shared, SpindleSnapshot, SpindleState};
use crate::drivers::{Mcp4725, PsuGate};
use crate::error::{Error, Result};

/// Controller tuning, taken from the service configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    pub ramp_delay: Duration,
    pub scale_factor: f64,
    pub write_policy: WritePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ramp_delay: Duration::ZERO,
            scale_factor: 0.4,
            write_policy: WritePolicy::BestEffort,
        }
    }
}

/// External spindle command.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RampRequest {
    /// `false` asserts emergency stop regardless of `target_rpm`.
    pub enable: bool,
    pub target_rpm: f64,
}

impl RampRequest {
    pub fn run(target_rpm: f64) -> Self {
        Self {
            enable: true,
            target_rpm,
        }
    }

    pub fn stop() -> Self {
        Self {
            enable: false,
            target_rpm: 0.0,
        }
    }
}

enum Mail {
    RampTo(f64),
}

/// Cloneable handle that asserts emergency stop from any thread.
pub struct EmergencyStop<P: OutputPin> {
    shared: Arc<Mutex<Shared<P>>>,
}

impl<P: OutputPin> Clone for EmergencyStop<P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<P: OutputPin> EmergencyStop<P> {
    /// Raise the flag and disable the PSU. Idempotent.
    pub fn assert(&self) -> Result<()> {
        lock(&self.shared).assert_emergency_stop()
    }

    pub fn is_asserted(&self) -> bool {
        lock(&self.shared).state.emergency_stop_active
    }
}

pub struct SpindleController<I2C, P>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
{
    shared: Arc<Mutex<Shared<P>>>,
    mailbox: Option<Sender<Mail>>,
    worker: Option<JoinHandle<RampEngine<I2C, P>>>,
}

impl<I2C, P> SpindleController<I2C, P>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
{
    /// Take ownership of the DAC and PSU gate and start the ramp worker.
    ///
    /// The PSU is driven disabled and emergency stop starts asserted; the first enabling request
    /// clears it.
    pub fn open(config: ControllerConfig, dac: Mcp4725<I2C>, mut psu: PsuGate<P>) -> Result<Self> {
        psu.disable().map_err(Error::setup)?;

        let state = SpindleState::new(config.ramp_delay, config.scale_factor);
        let shared = Arc::new(Mutex::new(Shared::new(state, psu)));

        let mut engine = RampEngine::new(dac, shared.clone(), config.write_policy);
        let (mailbox, inbox) = mpsc::channel::<Mail>();

        let worker = thread::Builder::new()
            .name("spindle-ramp".into())
            .spawn(move || {
                for mail in inbox {
                    match mail {
                        Mail::RampTo(rpm) => {
                            // Fail-fast aborts have already cut power and logged.
                            let _ = engine.ramp_to(rpm);
                        }
                    }
                }
                engine
            })
            .map_err(Error::setup)?;

        info!(
            "spindle controller open (scale {}, step delay {:?}, {:?})",
            config.scale_factor, config.ramp_delay, config.write_policy
        );

        Ok(Self {
            shared,
            mailbox: Some(mailbox),
            worker: Some(worker),
        })
    }

    /// Consistent snapshot of the spindle state.
    pub fn state(&self) -> SpindleSnapshot {
        lock(&self.shared).snapshot()
    }

    /// Apply an external command.
    ///
    /// Returns as soon as the ramp is queued; poll [`state`](Self::state) for completion.
    pub fn set_state(&self, request: RampRequest) -> Result<()> {
        if !request.enable {
            return self.emergency_stop();
        }
        if !request.target_rpm.is_finite() {
            return Err(Error::InvalidSetpoint(request.target_rpm));
        }

        let mailbox = self.mailbox.as_ref().ok_or(Error::Closed)?;

        let mut shared = lock(&self.shared);
        if self.worker.as_ref().map_or(true, JoinHandle::is_finished) {
            return Err(Self::worker_lost(&mut shared));
        }
        if shared.state.ramping {
            debug!("rejecting {} rpm: ramp in progress", request.target_rpm);
            return Err(Error::Busy);
        }

        shared.psu.as_mut().ok_or(Error::Closed)?.enable()?;
        shared.state.emergency_stop_active = false;
        shared.state.current_setpoint_rpm = request.target_rpm;

        if shared.state.voltage_for(request.target_rpm) == shared.state.current_voltage {
            shared.state.current_rpm = request.target_rpm;
            return Ok(());
        }

        shared.state.ramping = true;
        if mailbox.send(Mail::RampTo(request.target_rpm)).is_err() {
            return Err(Self::worker_lost(&mut shared));
        }

        debug!("queued ramp to {} rpm", request.target_rpm);
        Ok(())
    }

    /// Nothing is left to drive the DAC: cut power and drop the stale ramp.
    fn worker_lost(shared: &mut Shared<P>) -> Error {
        error!("ramp worker is gone, asserting emergency stop");
        // Already logged inside; the worker is gone either way.
        let _ = shared.assert_emergency_stop();
        shared.state.ramping = false;
        Error::WorkerLost
    }

    /// Assert emergency stop. Always takes effect, even while a ramp is running.
    pub fn emergency_stop(&self) -> Result<()> {
        lock(&self.shared).assert_emergency_stop()
    }

    /// Handle for asserting emergency stop from elsewhere (signal handlers, watchdogs).
    pub fn emergency_stop_handle(&self) -> EmergencyStop<P> {
        EmergencyStop {
            shared: self.shared.clone(),
        }
    }

    /// Change the step delay. A running ramp picks it up on its next step.
    pub fn set_ramp_delay(&self, delay: Duration) {
        lock(&self.shared).state.ramp_delay = delay;
    }

    /// Stop the spindle and release the hardware.
    ///
    /// Asserts emergency stop, waits for any running ramp to retract to zero, stops the worker and
    /// hands back the DAC and PSU gate.
    pub fn close(mut self) -> Result<(Mcp4725<I2C>, PsuGate<P>)> {
        let stopped = self.emergency_stop();
        let engine = self.shutdown()?;
        stopped?;

        let psu = lock(&self.shared).psu.take().ok_or(Error::Closed)?;
        info!("spindle controller closed");
        Ok((engine.into_dac(), psu))
    }

    fn shutdown(&mut self) -> Result<RampEngine<I2C, P>> {
        drop(self.mailbox.take());
        let worker = self.worker.take().ok_or(Error::Closed)?;
        worker.join().map_err(|_| Error::WorkerLost)
    }
}

impl<I2C, P> Drop for SpindleController<I2C, P>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
{
    fn drop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        if let Err(err) = self.emergency_stop() {
            error!("emergency stop on drop failed: {}", err);
        }
        if let Err(err) = self.shutdown() {
            error!("ramp worker shutdown failed: {}", err);
        }
    }
}
