/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transport sinks: where encoded frames go.
//!
//! ```text
//!          PlatformController
//!                 │
//!                 │ Arc<Mutex<Box<dyn TransportSink>>>
//!                 ▼
//!   ┌─────────────┴──────────────┐
//!   │ SerialSink   │   UdpSink   │
//!   │ (COMn, 8N1)  │ (datagram)  │
//!   └────────────────────────────┘
//! ```
//!
//! Sinks neither retry nor buffer.  A failed open or write is returned to the
//! caller as a [`TransportError`]; deciding what to do with it is the
//! scheduler's (per tick) or the controller's (on start) business.

pub mod serial;
pub mod udp;

pub use serial::SerialSink;
pub use udp::UdpSink;

use std::io;
use std::net::AddrParseError;

use thiserror::Error;

use crate::config::TransportConfig;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors raised by a [`TransportSink`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device could not be opened (missing, busy, permissions).
    #[error("cannot open serial port {port}")]
    SerialOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// The local UDP socket could not be created.
    #[error("cannot bind UDP socket on {local}")]
    SocketBind {
        local: String,
        #[source]
        source: io::Error,
    },

    /// The configured destination is not a valid `ip:port`.
    #[error("invalid destination address '{addr}'")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    /// `send` was called while the sink was closed.
    #[error("{target} is not open")]
    NotConnected { target: String },

    /// The OS reported a write error.
    #[error("write to {target} failed")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The OS accepted only part of the frame.
    #[error("short write to {target}: {written} of {expected} bytes")]
    ShortWrite {
        target: String,
        written: usize,
        expected: usize,
    },
}

// ── TransportSink ─────────────────────────────────────────────────────────────

/// A destination for encoded frames.
///
/// Implementations own their OS resource exclusively.  All calls may block;
/// the scheduler runs `send` on a blocking-capable thread.
pub trait TransportSink: Send {
    /// Acquire the underlying resource.  Calling it on an open sink is a no-op.
    fn start(&mut self) -> Result<(), TransportError>;

    /// Release the underlying resource.  Calling it on a closed sink is a no-op.
    fn stop(&mut self);

    /// Write `frame` in full, or fail.
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Whether the sink is currently able to send.
    fn is_connected(&self) -> bool;

    /// Human-readable destination, used in logs and error messages.
    fn target(&self) -> String;
}

/// Build the sink selected by configuration.
///
/// # Errors
/// Only UDP can fail here (bad address, socket creation); the serial sink
/// defers opening the port to [`TransportSink::start`].
pub fn build_sink(config: &TransportConfig) -> Result<Box<dyn TransportSink>, TransportError> {
    match config {
        TransportConfig::Serial(options) => Ok(Box::new(SerialSink::new(options.clone()))),
        TransportConfig::Udp(options) => Ok(Box::new(UdpSink::new(options)?)),
    }
}

// ── Test double ───────────────────────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────
