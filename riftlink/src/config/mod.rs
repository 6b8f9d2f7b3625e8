/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Platform link configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! interval_ms: 100
//! transport:
//!   kind: udp            # or "serial"
//!   ip: 127.0.0.1
//!   port: 6065
//! markers:               # optional; built-in values are unverified
//!   som: 0xFE
//!   eom: 0xFF
//!   esc: 0xFD
//! ```
//!
//! For `kind: serial`, `port` is the numeric port id (`COM{n}` /
//! `/dev/ttyUSB{n}`) and an optional `device` gives an explicit path.
//! Every section is optional; an empty file yields UDP to 127.0.0.1:6065 at
//! 100 ms.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::protocol::{FrameEncoder, Markers};

pub const DEFAULT_INTERVAL_MS: u64 = 100;
pub const DEFAULT_UDP_IP: &str = "127.0.0.1";
pub const DEFAULT_UDP_PORT: u16 = 6065;

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_udp_ip() -> String {
    DEFAULT_UDP_IP.to_string()
}

fn default_udp_port() -> u16 {
    DEFAULT_UDP_PORT
}

// ── Transport selection ───────────────────────────────────────────────────────

/// Destination of a UDP sink.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UdpOptions {
    #[serde(default = "default_udp_ip")]
    pub ip: String,
    #[serde(default = "default_udp_port")]
    pub port: u16,
}

impl Default for UdpOptions {
    fn default() -> Self {
        Self {
            ip: default_udp_ip(),
            port: default_udp_port(),
        }
    }
}

/// Parses `ip:port` (IPv6 as `[addr]:port`), as given on the command line.
impl FromStr for UdpOptions {
    type Err = AddrParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let addr: SocketAddr = s.parse()?;
        Ok(Self {
            ip: addr.ip().to_string(),
            port: addr.port(),
        })
    }
}

/// Serial port selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SerialOptions {
    /// Numeric port id, mapped to a device name by the serial sink.
    pub port: u8,
    /// Explicit device path; overrides `port` when present.
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    Udp(UdpOptions),
    Serial(SerialOptions),
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Udp(UdpOptions::default())
    }
}

impl TransportConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Udp(_) => "udp",
            TransportConfig::Serial(_) => "serial",
        }
    }
}

// ── RiftConfig ────────────────────────────────────────────────────────────────

/// Everything needed to build a [`PlatformController`](crate::controller::PlatformController).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiftConfig {
    /// Transmission period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default)]
    pub transport: TransportConfig,

    /// Framing sentinels.  `None` selects [`Markers::DEFAULT`].
    #[serde(default)]
    pub markers: Option<Markers>,
}

impl Default for RiftConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            transport: TransportConfig::default(),
            markers: None,
        }
    }
}

impl RiftConfig {
    /// Parses and validates `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML for this
    /// schema (including an unsound marker set), or fails [`validate`](Self::validate).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading platform configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        // An empty document deserializes as unit, not as an empty map.
        let config: RiftConfig = if content.trim().is_empty() {
            RiftConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        debug!(
            interval_ms = config.interval_ms,
            transport = config.transport.kind(),
            markers = ?config.markers(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        if let TransportConfig::Udp(udp) = &self.transport {
            udp.ip
                .parse::<IpAddr>()
                .with_context(|| format!("UDP destination '{}' is not an IP address", udp.ip))?;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// `true` when no `markers:` section was given, so frames use the
    /// built-in marker values, which have not been confirmed against the
    /// device.
    pub fn uses_placeholder_markers(&self) -> bool {
        self.markers.is_none()
    }

    pub fn markers(&self) -> Markers {
        self.markers.unwrap_or_default()
    }

    pub fn encoder(&self) -> FrameEncoder {
        FrameEncoder::with_markers(self.markers())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
