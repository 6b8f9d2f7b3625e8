/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the transmission scheduler.
//!
//! Two types model the two failure layers:
//!
//! * [`SchedulerError`]: the scheduler could not be started at all
//!   (returned synchronously from
//!   [`TransmissionScheduler::start()`](super::TransmissionScheduler::start)).
//! * [`TickFailure`]: one tick's frame was dropped because the sink failed.
//!   These are never returned; they are broadcast to subscribers while the
//!   scheduler keeps running.

use thiserror::Error;

// ── Lifecycle errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// `start()` was called outside a Tokio runtime, so there is nowhere to
    /// spawn the periodic task.
    #[error("no Tokio runtime available to run the transmission task")]
    NoRuntime,

    /// A zero period would spin the task.
    #[error("transmission interval must be greater than zero")]
    ZeroInterval,
}

// ── Per-tick failures ─────────────────────────────────────────────────────────

/// A send that failed during one tick.
///
/// `reason` is the rendered error chain rather than the error itself so the
/// value is `Clone` and can travel through a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tick {tick}: {reason}")]
pub struct TickFailure {
    /// 1-based tick counter since the scheduler was created.
    pub tick: u64,
    pub reason: String,
}
