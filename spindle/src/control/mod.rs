// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Spindle Control
//!
//! ## Modules
//!
//! - [`state`] - Spindle state and the lock that guards it.
//! - [`ramp`] - Stepped, emergency-stop aware DAC ramp.
//! - [`spindle`] - Controller façade used by the request layer.

pub mod ramp;
pub mod spindle;
pub mod state;

pub use ramp::{RampEngine, RampOutcome, WritePolicy};
pub use spindle::{ControllerConfig, EmergencyStop, RampRequest, SpindleController};
pub use state::{SpindleSnapshot, SpindleState};
