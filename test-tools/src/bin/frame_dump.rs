/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Prints the exact wire bytes for one orientation sample, for comparison
//! with a serial or network capture of the vendor software.
//!
//! ```text
//! $ frame-dump 10 -5
//! wire (19 bytes): FE 21 0C 01 00 00 20 41 00 00 A0 C0 00 00 00 00 B9 86 FF
//! ```

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use riftlink::protocol::{decode_frame, FrameEncoder, Markers};
use riftlink::Orientation;

#[derive(Debug, Parser)]
#[command(
    name = "frame-dump",
    about = "Encode one pitch/roll sample and print the frame",
    long_about = None,
)]
struct Cli {
    /// Pitch in degrees (clamped to the platform envelope).
    #[arg(allow_negative_numbers = true)]
    pitch: f32,

    /// Roll in degrees (clamped to the platform envelope).
    #[arg(allow_negative_numbers = true)]
    roll: f32,

    /// Skip envelope clamping and encode the values as given.
    #[arg(long = "raw")]
    raw: bool,
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("frame-dump: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let requested = Orientation::new(cli.pitch, cli.roll);
    let orientation = if cli.raw {
        requested
    } else {
        requested.clamped()
    };

    let frame = FrameEncoder::new().encode(orientation);
    let decoded = decode_frame(frame.as_bytes(), &Markers::DEFAULT)
        .context("Encoder produced an undecodable frame")?;

    println!("input       : pitch={} roll={}", cli.pitch, cli.roll);
    println!(
        "encoded     : pitch={} roll={}{}",
        orientation.pitch,
        orientation.roll,
        if orientation == requested { "" } else { " (clamped)" }
    );
    println!("wire ({:2} B) : {}", frame.len(), hex(frame.as_bytes()));
    println!("length byte : {}", decoded.declared_len);
    println!("command     : {}", decoded.command);
    println!("layout      : {:?}", decoded.layout());
    println!("checksum    : {:#06x}", decoded.checksum);
    println!("note        : default markers and flag are unverified placeholders");
    Ok(())
}
