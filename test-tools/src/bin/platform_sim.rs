/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Motion-platform simulator.
//!
//! Listens where the real platform would, decodes every datagram and logs
//! the orientation it carries.  Datagrams are also fed through a streaming
//! decoder so frames split or merged by a UDP bridge are still recognised.
//!
//! ```text
//! riftlink ──UDP──► platform-sim --bind 127.0.0.1:6065
//! ```

use std::net::SocketAddr;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use riftlink::protocol::{FrameDecoder, Markers, MAX_FRAME_LEN};

#[derive(Debug, Parser)]
#[command(
    name = "platform-sim",
    about = "Impersonates a FutuRift platform: receives and decodes frames",
    long_about = None,
)]
struct Cli {
    /// Local address to listen on.
    #[arg(short = 'b', long = "bind", default_value = "127.0.0.1:6065")]
    bind: SocketAddr,

    /// Exit after this many valid frames (default: run until Ctrl-C).
    #[arg(short = 'n', long = "count")]
    count: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("platform-sim failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let socket = UdpSocket::bind(cli.bind)
        .await
        .with_context(|| format!("Cannot bind {}", cli.bind))?;
    info!(bind = %cli.bind, "platform simulator listening");

    let mut decoder = FrameDecoder::new(Markers::DEFAULT);
    // Room for a few merged frames.
    let mut buf = vec![0u8; MAX_FRAME_LEN * 8];
    let mut valid = 0u64;
    let mut invalid = 0u64;

    loop {
        let (len, peer) = tokio::select! {
            res = socket.recv_from(&mut buf) => res.context("recv_from failed")?,
            _ = tokio::signal::ctrl_c() => break,
        };
        debug!(%peer, len, bytes = ?&buf[..len], "datagram");

        for result in decoder.feed(&buf[..len]) {
            match result {
                Ok(frame) => {
                    valid += 1;
                    info!(
                        n     = valid,
                        pitch = frame.orientation.pitch,
                        roll  = frame.orientation.roll,
                        crc   = frame.checksum,
                        "frame"
                    );
                }
                Err(e) => {
                    invalid += 1;
                    warn!(%peer, error = %e, "rejected frame");
                }
            }
        }

        if cli.count.is_some_and(|n| valid >= n) {
            break;
        }
    }

    info!(valid, invalid, "platform simulator exiting");
    Ok(())
}
