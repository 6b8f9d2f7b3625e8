/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Serial-line sink.
//!
//! The platform's serial link is fixed at 115200 baud, 8 data bits, no
//! parity, one stop bit.  The port is opened read/write with a 500 ms read
//! timeout even though only writes are issued.  The driver-side 4096-byte
//! buffers are left to the OS; `serialport` does not expose them.

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use super::{TransportError, TransportSink};
use crate::config::SerialOptions;

// ── Line settings ─────────────────────────────────────────────────────────────

pub const BAUD_RATE: u32 = 115_200;

pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Driver buffer size the platform vendor specifies.  Logged on open; the
/// OS picks the real size.
pub const DRIVER_BUFFER_SIZE: usize = 4096;

/// Map a numeric port id to the platform's device name.
pub fn device_name(port: u8) -> String {
    if cfg!(windows) {
        format!("COM{port}")
    } else {
        format!("/dev/ttyUSB{port}")
    }
}

// ── SerialSink ────────────────────────────────────────────────────────────────

pub struct SerialSink {
    device: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialSink {
    /// Create a closed sink.  Nothing touches the device until
    /// [`start`](TransportSink::start).
    pub fn new(options: SerialOptions) -> Self {
        let device = options.device.unwrap_or_else(|| device_name(options.port));
        Self { device, port: None }
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl TransportSink for SerialSink {
    fn start(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            debug!(device = %self.device, "serial port already open");
            return Ok(());
        }

        let port = serialport::new(self.device.as_str(), BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| TransportError::SerialOpen {
                port: self.device.clone(),
                source,
            })?;

        info!(
            device = %self.device,
            baud = BAUD_RATE,
            driver_buffer = DRIVER_BUFFER_SIZE,
            "serial port opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn stop(&mut self) {
        if self.port.take().is_some() {
            info!(device = %self.device, "serial port closed");
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or_else(|| TransportError::NotConnected {
            target: self.device.clone(),
        })?;

        port.write_all(frame)
            .and_then(|()| port.flush())
            .map_err(|source| TransportError::Write {
                target: self.device.clone(),
                source,
            })
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn target(&self) -> String {
        self.device.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
