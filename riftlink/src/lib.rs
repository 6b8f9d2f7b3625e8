/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! riftlink – pitch/roll streaming to a FutuRift motion platform
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── orientation/    – clamped pitch/roll value + shared guarded holder
//! ├── protocol/       – framing, escaping, CRC-16, decoder
//! ├── transport/      – TransportSink trait, serial + UDP sinks
//! ├── scheduler/      – periodic transmission task, stats, failure channel
//! ├── controller/     – PlatformController facade
//! └── config/         – YAML configuration
//! ```

pub mod config;
pub mod controller;
pub mod orientation;
pub mod protocol;
pub mod scheduler;
pub mod transport;

pub use controller::{ControllerError, PlatformController};
pub use orientation::Orientation;
