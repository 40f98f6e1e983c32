// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! REST protocol spoken with the machine controller (LinuxCNC side).

pub mod messages;
pub mod router;

pub use messages::{SpindleCommand, SpindleStatus};
pub use router::{read_body, route, Method, Reply, SpindleService, MAX_BODY};
