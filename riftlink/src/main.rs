/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use riftlink::config::{RiftConfig, SerialOptions, TransportConfig, UdpOptions};
use riftlink::orientation::{PITCH_MAX, PITCH_MIN, ROLL_MAX};
use riftlink::PlatformController;

/// Rate at which the motion profile updates the target orientation.
const PROFILE_RATE: Duration = Duration::from_millis(20);

const SWEEP_PITCH_PERIOD_SECS: f32 = 8.0;
const SWEEP_ROLL_PERIOD_SECS: f32 = 5.0;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Streams pitch/roll frames to a FutuRift motion platform.
///
/// Example:
///   riftlink --udp 192.168.1.40:6065 --sweep --duration-secs 30
///   riftlink --serial 3 --pitch 10 --roll -5
#[derive(Debug, Parser)]
#[command(
    name = "riftlink",
    about = "FutuRift motion platform link – serial / UDP frame streamer",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Transmission interval in milliseconds (overrides the file).
    #[arg(short = 'i', long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Send over UDP to ip:port (overrides the file).
    #[arg(long = "udp", conflicts_with_all = ["serial", "device"])]
    udp: Option<UdpOptions>,

    /// Send over serial port number n (COMn / /dev/ttyUSBn).
    #[arg(long = "serial")]
    serial: Option<u8>,

    /// Explicit serial device path; implies the serial transport.
    #[arg(long = "device")]
    device: Option<String>,

    /// Hold this pitch (degrees).
    #[arg(long = "pitch", default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f32,

    /// Hold this roll (degrees).
    #[arg(long = "roll", default_value_t = 0.0, allow_negative_numbers = true)]
    roll: f32,

    /// Sweep pitch and roll across the full envelope instead of holding.
    #[arg(long = "sweep", conflicts_with_all = ["pitch", "roll"])]
    sweep: bool,

    /// Stop after this many seconds (default: run until Ctrl-C).
    #[arg(short = 'd', long = "duration-secs")]
    duration_secs: Option<u64>,
}

impl Cli {
    /// Merge command-line overrides into the file configuration.
    fn apply_overrides(&self, config: &mut RiftConfig) {
        if let Some(ms) = self.interval_ms {
            config.interval_ms = ms;
        }
        if let Some(udp) = &self.udp {
            config.transport = TransportConfig::Udp(udp.clone());
        }
        if self.serial.is_some() || self.device.is_some() {
            let port = match (&config.transport, self.serial) {
                (_, Some(n)) => n,
                (TransportConfig::Serial(current), None) => current.port,
                (TransportConfig::Udp(_), None) => 0,
            };
            config.transport = TransportConfig::Serial(SerialOptions {
                port,
                device: self.device.clone(),
            });
        }
    }

    fn profile(&self) -> MotionProfile {
        if self.sweep {
            MotionProfile::Sweep
        } else {
            MotionProfile::Hold {
                pitch: self.pitch,
                roll: self.roll,
            }
        }
    }
}

// ── Motion profile ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum MotionProfile {
    Hold { pitch: f32, roll: f32 },
    Sweep,
}

impl MotionProfile {
    /// Target (pitch, roll) at `t` seconds after start.
    fn sample(self, t: f32) -> (f32, f32) {
        match self {
            MotionProfile::Hold { pitch, roll } => (pitch, roll),
            MotionProfile::Sweep => {
                let mid = (PITCH_MAX + PITCH_MIN) / 2.0;
                let half = (PITCH_MAX - PITCH_MIN) / 2.0;
                let pitch = mid + half * (TAU * t / SWEEP_PITCH_PERIOD_SECS).sin();
                let roll = ROLL_MAX * (TAU * t / SWEEP_ROLL_PERIOD_SECS).sin();
                (pitch, roll)
            }
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=trace shows
    // every frame).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("riftlink failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Configuration ─────────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => RiftConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using defaults");
            RiftConfig::default()
        }
    };
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid command-line overrides")?;

    let profile = cli.profile();
    info!(
        interval_ms = config.interval_ms,
        transport   = config.transport.kind(),
        profile     = ?profile,
        duration    = ?cli.duration_secs,
        "Configuration"
    );

    // ── Controller ────────────────────────────────────────────────────────────
    let mut controller =
        PlatformController::from_config(&config).context("Failed to create platform link")?;
    let (pitch, roll) = profile.sample(0.0);
    controller.set_orientation(pitch, roll);
    controller
        .start()
        .with_context(|| format!("Failed to start link to {}", controller.target()))?;

    // ── Motion loop ───────────────────────────────────────────────────────────
    let shutdown = async {
        match cli.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(shutdown);
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(ctrl_c);

    let mut ticker = tokio::time::interval(PROFILE_RATE);
    let started = Instant::now();
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
            _ = &mut shutdown => {
                info!("Duration elapsed, shutting down");
                break;
            }
            _ = ticker.tick() => {
                let (pitch, roll) = profile.sample(started.elapsed().as_secs_f32());
                controller.set_orientation(pitch, roll);
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    controller.stop().await;
    let stats = controller.stats();
    info!(
        ticks         = stats.ticks,
        frames_sent   = stats.frames_sent,
        bytes_sent    = stats.bytes_sent,
        send_failures = stats.send_failures,
        "Final statistics"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
