/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Connectionless UDP sink.
//!
//! Each frame is one datagram.  There is no session to open or close, so the
//! sink reports itself connected from construction and `start`/`stop` do
//! nothing.  The local socket is bound to an ephemeral port up front.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::debug;

use super::{TransportError, TransportSink};
use crate::config::UdpOptions;

pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpSink {
    /// Parse the destination and bind a local socket of the matching family.
    pub fn new(options: &UdpOptions) -> Result<Self, TransportError> {
        let ip: IpAddr = options
            .ip
            .parse()
            .map_err(|source| TransportError::InvalidAddress {
                addr: format!("{}:{}", options.ip, options.port),
                source,
            })?;
        let destination = SocketAddr::new(ip, options.port);

        let local = match ip {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local).map_err(|source| TransportError::SocketBind {
            local: local.to_string(),
            source,
        })?;

        debug!(%destination, "UDP sink ready");
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl TransportSink for UdpSink {
    fn start(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let written = self
            .socket
            .send_to(frame, self.destination)
            .map_err(|source| TransportError::Write {
                target: self.target(),
                source,
            })?;
        if written != frame.len() {
            return Err(TransportError::ShortWrite {
                target: self.target(),
                written,
                expected: frame.len(),
            });
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn target(&self) -> String {
        format!("udp://{}", self.destination)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
