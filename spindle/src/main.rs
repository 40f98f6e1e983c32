// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tiny_http::{Header, Response, Server};

use spindle::control::{SpindleController, WritePolicy};
use spindle::protocol::{read_body, route, Method};
use spindle::service::Service;
use spindle::{hw, Config, Error, Result};

/// REST-controlled CNC spindle driver.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// I2C device of the DAC, e.g. /dev/i2c-1.
    #[arg(long)]
    device: Option<String>,

    /// DAC bus address.
    #[arg(long, value_parser = parse_address)]
    address: Option<u8>,

    /// GPIO of the active-low PSU enable line.
    #[arg(long)]
    psu_enable_pin: Option<u8>,

    /// GPIO holding the DAC's A0 address bit low.
    #[arg(long)]
    address_select_pin: Option<u8>,

    /// GPIO of the active-low status LED.
    #[arg(long, conflicts_with = "no_status_led")]
    status_led_pin: Option<u8>,

    /// Run without a status LED.
    #[arg(long)]
    no_status_led: bool,

    /// Pause between DAC codes, in microseconds.
    #[arg(long)]
    ramp_delay_us: Option<u64>,

    /// RPM to DAC code conversion constant.
    #[arg(long)]
    scale_factor: Option<f64>,

    /// best-effort or fail-fast.
    #[arg(long)]
    write_policy: Option<WritePolicy>,

    /// HTTP listen address.
    #[arg(long)]
    listen: Option<String>,

    /// Store 0 V as the DAC power-up default before starting.
    #[arg(long)]
    write_nv_init: bool,
}

fn parse_address(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| err.to_string())
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(pin) = self.psu_enable_pin {
            config.psu_enable_pin = pin;
        }
        if let Some(pin) = self.address_select_pin {
            config.address_select_pin = pin;
        }
        if let Some(pin) = self.status_led_pin {
            config.status_led_pin = Some(pin);
        }
        if self.no_status_led {
            config.status_led_pin = None;
        }
        if let Some(delay) = self.ramp_delay_us {
            config.ramp_delay_us = delay;
        }
        if let Some(scale) = self.scale_factor {
            config.scale_factor = scale;
        }
        if let Some(policy) = self.write_policy {
            config.write_policy = policy;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }

        config.validate()?;
        Ok(config)
    }
}

fn serve(server: &Server, controller: &SpindleController<rppal::i2c::I2c, rppal::gpio::OutputPin>) {
    for mut request in server.incoming_requests() {
        let method = match request.method() {
            tiny_http::Method::Get => Method::Get,
            tiny_http::Method::Post => Method::Post,
            _ => Method::Other,
        };

        let reply = match read_body(request.as_reader()) {
            Ok(body) => route(controller, method, request.url(), &body),
            Err(reply) => reply,
        };
        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
            response = response.with_header(header);
        }

        if let Err(err) = request.respond(response) {
            warn!("could not send response: {}", err);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let write_nv_init = args.write_nv_init;
    let config = args.into_config()?;

    let mut hardware = hw::rpi::open(&config)?;
    if write_nv_init {
        hardware.dac.write_power_on_default(0)?;
        info!("stored 0 V as DAC power-up default");
    }

    let controller = SpindleController::open(config.controller(), hardware.dac, hardware.psu)?;
    let service = Service::start(controller, hardware.status_led)?;

    let server = Arc::new(Server::http(&config.listen).map_err(|err| Error::Setup(err.to_string()))?);
    info!("listening on {}", config.listen);

    {
        let server = server.clone();
        let estop = service.controller().emergency_stop_handle();
        ctrlc::set_handler(move || {
            warn!("termination requested, stopping spindle");
            if let Err(err) = estop.assert() {
                error!("emergency stop failed: {}", err);
            }
            server.unblock();
        })
        .map_err(|err| Error::Setup(err.to_string()))?;
    }

    serve(&server, service.controller());

    let (_dac, psu) = service.stop()?;
    // Keep the PSU line driven disabled after exit instead of floating back to an input.
    let mut pin = psu.free();
    pin.set_reset_on_drop(false);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
