// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Request routing for the spindle REST surface.
//!
//! Transport-agnostic: the HTTP server hands over method, path and body and writes back the
//! [`Reply`]. Routes:
//!
//! | Method | Path       | Result |
//! | ------ | ---------- | ------ |
//! | GET    | `/`        | plain-text banner |
//! | GET    | `/spindle` | [`SpindleStatus`] |
//! | POST   | `/spindle` | apply a [`SpindleCommand`], reply without waiting for the ramp |

use std::io::Read;

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::control::{RampRequest, SpindleController};
use crate::error::{Error, Result};
use crate::protocol::messages::{SpindleCommand, SpindleStatus};

pub const BANNER: &str = "CNC Milling Machine REST Server\n";

const JSON: &str = "application/json; charset=UTF-8";
const TEXT: &str = "text/plain; charset=UTF-8";

/// Largest request body accepted, in bytes.
pub const MAX_BODY: u64 = 4096;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: JSON,
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.to_string(),
        }
    }

    fn error(status: u16, err: &Error) -> Self {
        let body = serde_json::json!({ "error": err.to_string() }).to_string();
        Self::json(status, body)
    }
}

/// What the request layer needs from a spindle.
pub trait SpindleService {
    fn status(&self) -> SpindleStatus;
    fn command(&self, request: RampRequest) -> Result<()>;
}

impl<I2C, P> SpindleService for SpindleController<I2C, P>
where
    I2C: I2c + Send + 'static,
    P: OutputPin + Send + 'static,
{
    fn status(&self) -> SpindleStatus {
        self.state().into()
    }

    fn command(&self, request: RampRequest) -> Result<()> {
        self.set_state(request)
    }
}

/// Read a request body of at most [`MAX_BODY`] bytes.
///
/// On failure the error reply to send back is returned instead.
pub fn read_body<R: Read>(reader: R) -> core::result::Result<Vec<u8>, Reply> {
    let mut body = Vec::new();
    if let Err(err) = reader.take(MAX_BODY + 1).read_to_end(&mut body) {
        warn!("could not read request body: {}", err);
        return Err(Reply::text(400, "could not read request body\n"));
    }
    if body.len() as u64 > MAX_BODY {
        warn!("request body over {} bytes", MAX_BODY);
        return Err(Reply::text(413, "request body too large\n"));
    }
    Ok(body)
}

pub fn route<S: SpindleService>(service: &S, method: Method, path: &str, body: &[u8]) -> Reply {
    let path = path.split('?').next().unwrap_or("");
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    match (path, method) {
        ("/", Method::Get) => Reply::text(200, BANNER),
        ("/spindle", Method::Get) => get_spindle(service),
        ("/spindle", Method::Post) => post_spindle(service, body),
        ("/", _) | ("/spindle", _) => Reply::text(405, "method not allowed\n"),
        _ => Reply::text(404, "not found\n"),
    }
}

fn get_spindle<S: SpindleService>(service: &S) -> Reply {
    match serde_json::to_string(&service.status()) {
        Ok(body) => Reply::json(200, body),
        Err(err) => Reply::error(500, &Error::from(err)),
    }
}

fn post_spindle<S: SpindleService>(service: &S, body: &[u8]) -> Reply {
    let command: SpindleCommand = match serde_json::from_slice(body) {
        Ok(command) => command,
        Err(err) => {
            let err = Error::from(err);
            warn!("{}", err);
            return Reply::error(400, &err);
        }
    };
    info!(
        "spindle command: enable={} setpoint={:?}",
        command.enable, command.setpoint
    );

    let request = match RampRequest::try_from(command) {
        Ok(request) => request,
        Err(err) => {
            warn!("spindle command rejected: {}", err);
            return Reply::error(400, &err);
        }
    };

    match service.command(request) {
        Ok(()) => Reply::json(200, "{}".to_string()),
        Err(err) => {
            warn!("spindle command rejected: {}", err);
            let status = match err {
                Error::Busy => 409,
                Error::InvalidSetpoint(_) | Error::MissingSetpoint | Error::Range(_) => 400,
                Error::Closed | Error::WorkerLost => 503,
                _ => 500,
            };
            Reply::error(status, &err)
        }
    }
}
