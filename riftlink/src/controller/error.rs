/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use thiserror::Error;

use crate::scheduler::SchedulerError;
use crate::transport::TransportError;

/// Failure of a [`PlatformController`](super::PlatformController) operation.
///
/// Only construction and `start()` can fail; both are surfaced synchronously
/// and never retried.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The sink could not be built or opened.
    #[error("transport failure")]
    Transport(#[from] TransportError),

    /// The transmission task could not be started.  The sink has already been
    /// closed again when this is returned.
    #[error("scheduler failure")]
    Scheduler(#[from] SchedulerError),
}
