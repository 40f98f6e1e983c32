// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Crate-wide error type.

use thiserror::Error;

/// Everything that can go wrong between the request layer and the hardware.
#[derive(Debug, Error)]
pub enum Error {
    /// DAC code outside the 12-bit range.
    #[error("voltage code {0} is outside 0..=4095")]
    Range(i32),

    /// Bus write or GPIO drive failure.
    #[error("hardware I/O failed: {0}")]
    Io(String),

    /// A ramp is already running. The caller should retry once `ramping` clears.
    #[error("a ramp is already in progress")]
    Busy,

    /// Pin or bus acquisition failed while opening the hardware.
    #[error("hardware setup failed: {0}")]
    Setup(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("setpoint {0} is not a finite RPM value")]
    InvalidSetpoint(f64),

    #[error("setpoint is required when enabling the spindle")]
    MissingSetpoint,

    #[error("spindle controller is closed")]
    Closed,

    #[error("ramp worker terminated unexpectedly")]
    WorkerLost,
}

impl Error {
    /// Wrap an `embedded-hal` I2C error.
    pub fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Error::Io(format!("i2c: {:?}", err.kind()))
    }

    /// Wrap an `embedded-hal` digital pin error.
    pub fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Io(format!("gpio: {:?}", err.kind()))
    }

    pub(crate) fn setup(err: impl std::fmt::Display) -> Self {
        Error::Setup(err.to_string())
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
