// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Stepped DAC ramp.
//!
//! The engine walks the DAC output one code at a time toward the code for a target RPM, sleeping
//! `ramp_delay` between codes. Jumping straight to the target would put a large current transient
//! on the drive; the delay sets the acceleration.
//!
//! The emergency-stop flag is sampled under the state lock at the start of every step. Once it is
//! seen the target becomes zero for the rest of the ramp: the output always retracts fully rather
//! than freezing at an intermediate speed. The reaction time is therefore bounded by one step
//! (one bus write plus one `ramp_delay`).

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread;

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::control::state::{lock, Shared};
use crate::drivers::Mcp4725;
use crate::error::{Error, Result};

/// What to do when a step write fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Log the failure and keep stepping on schedule. The next step writes the next code anyway.
    #[default]
    BestEffort,
    /// Abort the ramp on the first failure and assert emergency stop.
    FailFast,
}

impl FromStr for WritePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "best-effort" => Ok(WritePolicy::BestEffort),
            "fail-fast" => Ok(WritePolicy::FailFast),
            other => Err(Error::Config(format!(
                "unknown write policy `{}` (expected `best-effort` or `fail-fast`)",
                other
            ))),
        }
    }
}

/// How a ramp ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RampOutcome {
    /// Output was already at the target code; nothing was written.
    Unchanged,
    /// Output reached the code for the requested RPM.
    Reached,
    /// Emergency stop was seen and the output was retracted to zero.
    Retracted,
}

/// Owns the DAC and runs one ramp at a time against the shared spindle state.
pub struct RampEngine<I2C, P: OutputPin> {
    dac: Mcp4725<I2C>,
    shared: Arc<Mutex<Shared<P>>>,
    policy: WritePolicy,
}

impl<I2C: I2c, P: OutputPin> RampEngine<I2C, P> {
    pub(crate) fn new(
        dac: Mcp4725<I2C>,
        shared: Arc<Mutex<Shared<P>>>,
        policy: WritePolicy,
    ) -> Self {
        Self {
            dac,
            shared,
            policy,
        }
    }

    /// Ramp the output to the code for `target_rpm`.
    ///
    /// Every code between the current one and the final one is written exactly once, in order.
    /// Returns an error only under [`WritePolicy::FailFast`].
    pub fn ramp_to(&mut self, target_rpm: f64) -> Result<RampOutcome> {
        let (mut current, mut target, mut stopped) = {
            let mut shared = lock(&self.shared);
            let state = &mut shared.state;

            let stopped = state.emergency_stop_active;
            let target = if stopped {
                0
            } else {
                state.voltage_for(target_rpm)
            };

            if target == state.current_voltage {
                state.ramping = false;
                state.current_rpm = if stopped { 0.0 } else { target_rpm };
                return Ok(RampOutcome::Unchanged);
            }

            state.ramping = true;
            (state.current_voltage, target, stopped)
        };

        debug!("ramp {} -> {} ({} rpm)", current, target, target_rpm);

        // Last code a write was attempted for.
        let mut attempted: Option<u16> = None;

        loop {
            let delay = {
                let mut shared = lock(&self.shared);
                shared.state.current_voltage = current;

                if shared.state.emergency_stop_active && !stopped {
                    debug!("emergency stop seen at code {}, retracting", current);
                    stopped = true;
                    target = 0;
                }

                if current == target && attempted == Some(current) {
                    let state = &mut shared.state;
                    state.current_rpm = if stopped { 0.0 } else { target_rpm };
                    state.ramping = false;
                    debug!("ramp finished at code {}", current);
                    return Ok(if stopped {
                        RampOutcome::Retracted
                    } else {
                        RampOutcome::Reached
                    });
                }

                shared.state.ramp_delay
            };

            attempted = Some(current);
            if let Err(err) = self.dac.write_voltage(current) {
                match self.policy {
                    WritePolicy::BestEffort => {
                        warn!("step write at code {} failed: {}", current, err);
                    }
                    WritePolicy::FailFast => {
                        self.abort(current, &err);
                        return Err(err);
                    }
                }
            }

            if current != target {
                thread::sleep(delay);
                if target > current {
                    current += 1;
                } else {
                    current -= 1;
                }
            }
        }
    }

    fn abort(&mut self, current: u16, err: &Error) {
        error!("aborting ramp at code {}: {}", current, err);

        let mut shared = lock(&self.shared);
        // Already logged inside; the abort stands either way.
        let _ = shared.assert_emergency_stop();
        let state = &mut shared.state;
        state.current_voltage = current;
        state.current_rpm = 0.0;
        state.ramping = false;
    }

    /// Give the DAC back.
    pub fn into_dac(self) -> Mcp4725<I2C> {
        self.dac
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::control::state::SpindleState;
    use crate::drivers::PsuGate;
    use crate::hw::mock::{MockI2c, MockPin};

    fn init_logs() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    struct Rig {
        bus: MockI2c,
        pin: MockPin,
        shared: Arc<Mutex<Shared<MockPin>>>,
        engine: RampEngine<MockI2c, MockPin>,
    }

    fn rig(policy: WritePolicy) -> Rig {
        init_logs();
        let bus = MockI2c::new();
        let pin = MockPin::new();
        let mut psu = PsuGate::active_low(pin.clone()).unwrap();
        psu.enable().unwrap();

        let mut state = SpindleState::new(Duration::ZERO, 0.4);
        state.emergency_stop_active = false;
        let shared = Arc::new(Mutex::new(Shared::new(state, psu)));

        let engine = RampEngine::new(Mcp4725::new(bus.clone(), 0x62), shared.clone(), policy);
        Rig {
            bus,
            pin,
            shared,
            engine,
        }
    }

    #[test]
    fn policy_parses() {
        assert_eq!("best-effort".parse::<WritePolicy>().unwrap(), WritePolicy::BestEffort);
        assert_eq!("fail-fast".parse::<WritePolicy>().unwrap(), WritePolicy::FailFast);
        assert!(matches!("yolo".parse::<WritePolicy>(), Err(Error::Config(_))));
    }

    #[test]
    fn ramp_up_visits_every_code_once() {
        let mut rig = rig(WritePolicy::BestEffort);

        assert_eq!(rig.engine.ramp_to(10_000.0).unwrap(), RampOutcome::Reached);

        let expected: Vec<u16> = (0..=4000).collect();
        assert_eq!(rig.bus.codes(), expected);

        let state = lock(&rig.shared).state.clone();
        assert_eq!(state.current_voltage, 4000);
        assert_eq!(state.current_rpm, 10_000.0);
        assert!(!state.ramping);
    }

    #[test]
    fn ramp_back_down_to_zero() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.engine.ramp_to(10_000.0).unwrap();
        let before = rig.bus.codes().len();

        assert_eq!(rig.engine.ramp_to(0.0).unwrap(), RampOutcome::Reached);

        let codes = rig.bus.codes();
        let down: Vec<u16> = (0..=4000).rev().collect();
        assert_eq!(&codes[before..], &down[..]);
        // 4000 descending steps between 4001 codes.
        assert_eq!(down.len() - 1, 4000);
        assert_eq!(lock(&rig.shared).state.current_voltage, 0);
    }

    #[test]
    fn partial_ramps_are_monotonic() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.engine.ramp_to(250.0).unwrap(); // code 100
        rig.engine.ramp_to(100.0).unwrap(); // code 40

        let codes = rig.bus.codes();
        let expected: Vec<u16> = (0..=100).chain((40..=100).rev()).collect();
        assert_eq!(codes, expected);
    }

    #[test]
    fn same_code_is_a_no_op() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.engine.ramp_to(1_000.0).unwrap();
        let writes = rig.bus.codes().len();

        // 1001 rpm rounds to the same code as 1000 rpm.
        assert_eq!(rig.engine.ramp_to(1_001.0).unwrap(), RampOutcome::Unchanged);
        assert_eq!(rig.bus.codes().len(), writes);

        let state = lock(&rig.shared).state.clone();
        assert!(!state.ramping);
        assert_eq!(state.current_rpm, 1_001.0);
    }

    #[test]
    fn target_is_clamped() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.engine.ramp_to(50_000.0).unwrap();
        assert_eq!(lock(&rig.shared).state.current_voltage, 4095);
        assert_eq!(rig.bus.codes().last(), Some(&4095));
    }

    #[test]
    fn emergency_stop_before_start_targets_zero() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.engine.ramp_to(5_000.0).unwrap(); // code 2000
        let before = rig.bus.codes().len();

        lock(&rig.shared).assert_emergency_stop().unwrap();
        assert_eq!(rig.engine.ramp_to(10_000.0).unwrap(), RampOutcome::Retracted);

        let codes = rig.bus.codes();
        let down: Vec<u16> = (0..=2000).rev().collect();
        assert_eq!(&codes[before..], &down[..]);

        let state = lock(&rig.shared).state.clone();
        assert_eq!(state.current_voltage, 0);
        assert_eq!(state.current_rpm, 0.0);
        assert!(!state.ramping);
        assert_eq!(rig.pin.level(), Some(true));
    }

    #[test]
    fn emergency_stop_mid_ramp_reverses() {
        let mut rig = rig(WritePolicy::BestEffort);

        let shared = rig.shared.clone();
        let pause = rig.bus.pause_at(1500);
        let stopper = thread::spawn(move || {
            pause.reached.recv().unwrap();
            lock(&shared).assert_emergency_stop().unwrap();
            pause.release.send(()).unwrap();
        });

        assert_eq!(rig.engine.ramp_to(10_000.0).unwrap(), RampOutcome::Retracted);
        stopper.join().unwrap();

        // The write in flight finishes and one more step is taken before the flag is sampled.
        let expected: Vec<u16> = (0..=1501).chain((0..=1500).rev()).collect();
        assert_eq!(rig.bus.codes(), expected);

        let state = lock(&rig.shared).state.clone();
        assert_eq!(state.current_voltage, 0);
        assert!(!state.ramping);
        assert_eq!(rig.pin.level(), Some(true));
    }

    #[test]
    fn best_effort_skips_failed_codes() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.bus.fail_code(Some(50));

        assert_eq!(rig.engine.ramp_to(250.0).unwrap(), RampOutcome::Reached);

        let expected: Vec<u16> = (0..=100).filter(|c| *c != 50).collect();
        assert_eq!(rig.bus.codes(), expected);
        assert_eq!(lock(&rig.shared).state.current_voltage, 100);
    }

    #[test]
    fn best_effort_finishes_even_if_final_write_fails() {
        let mut rig = rig(WritePolicy::BestEffort);
        rig.bus.fail_code(Some(100));

        assert_eq!(rig.engine.ramp_to(250.0).unwrap(), RampOutcome::Reached);
        assert_eq!(rig.bus.codes().last(), Some(&99));
        assert_eq!(lock(&rig.shared).state.current_voltage, 100);
    }

    #[test]
    fn fail_fast_aborts_and_cuts_power() {
        let mut rig = rig(WritePolicy::FailFast);
        rig.bus.fail_code(Some(50));

        assert!(matches!(rig.engine.ramp_to(250.0), Err(Error::Io(_))));

        let expected: Vec<u16> = (0..50).collect();
        assert_eq!(rig.bus.codes(), expected);

        let state = lock(&rig.shared).state.clone();
        assert!(!state.ramping);
        assert!(state.emergency_stop_active);
        assert_eq!(state.current_rpm, 0.0);
        assert_eq!(rig.pin.level(), Some(true));
    }
}
