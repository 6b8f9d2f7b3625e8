/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Public facade over orientation state, scheduler and sink.
//!
//! ```text
//!   set_pitch / set_roll ──► SharedOrientation ◄── snapshot ── TransmissionScheduler
//!                                                                    │
//!   start(): sink.start() then scheduler.start()                     │ send
//!   stop():  scheduler.stop() then sink.stop()                       ▼
//!                                                            Box<dyn TransportSink>
//! ```
//!
//! Setters only take the orientation lock, never the sink lock, so a blocked
//! serial write cannot stall them.  The same holds for `is_connected()`,
//! which reads a flag mirrored from the sink on every start and stop.

pub mod error;

pub use error::ControllerError;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::RiftConfig;
use crate::orientation::{Orientation, SharedOrientation};
use crate::protocol::FrameEncoder;
use crate::scheduler::{SharedSink, StatsSnapshot, TickFailure, TransmissionScheduler};
use crate::transport::{build_sink, TransportSink};

pub struct PlatformController {
    orientation: SharedOrientation,
    sink: SharedSink,
    /// Last `is_connected()` reported by the sink, refreshed on start/stop.
    connected: AtomicBool,
    scheduler: TransmissionScheduler,
}

impl PlatformController {
    /// Wrap an unopened sink.  Orientation starts level at `(0, 0)`.
    pub fn new(sink: Box<dyn TransportSink>, interval: Duration, encoder: FrameEncoder) -> Self {
        let connected = AtomicBool::new(sink.is_connected());
        Self {
            orientation: SharedOrientation::new(),
            sink: Arc::new(Mutex::new(sink)),
            connected,
            scheduler: TransmissionScheduler::new(interval, encoder),
        }
    }

    /// Build the sink, interval and marker set described by `config`.
    ///
    /// # Errors
    /// [`ControllerError::Transport`] if the UDP destination is invalid or its
    /// socket cannot be bound.  Serial ports are not opened until
    /// [`start`](Self::start).
    pub fn from_config(config: &RiftConfig) -> Result<Self, ControllerError> {
        if config.uses_placeholder_markers() {
            let m = config.markers();
            warn!(
                som = m.som(),
                eom = m.eom(),
                esc = m.esc(),
                "no markers configured, using unverified default framing values"
            );
        }
        let sink = build_sink(&config.transport)?;
        Ok(Self::new(sink, config.interval(), config.encoder()))
    }

    // The sink leaves itself consistent after every call, so a poisoned guard
    // is still usable.
    fn sink(&self) -> MutexGuard<'_, Box<dyn TransportSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Orientation ───────────────────────────────────────────────────────────

    /// Clamped to `[-15, 21]`; NaN becomes `0`.
    pub fn set_pitch(&self, pitch: f32) {
        self.orientation.set_pitch(pitch);
    }

    /// Clamped to `[-18, 18]`; NaN becomes `0`.
    pub fn set_roll(&self, roll: f32) {
        self.orientation.set_roll(roll);
    }

    /// Update both axes atomically with respect to the scheduler.
    pub fn set_orientation(&self, pitch: f32, roll: f32) {
        self.orientation.set(Orientation::new(pitch, roll));
    }

    /// Effective (clamped) pitch, as the next frame will carry it.
    pub fn pitch(&self) -> f32 {
        self.orientation.pitch()
    }

    pub fn roll(&self) -> f32 {
        self.orientation.roll()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.snapshot()
    }

    /// A handle for setter threads that do not own the controller.
    pub fn orientation_handle(&self) -> SharedOrientation {
        self.orientation.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Open the sink, then start transmitting.
    ///
    /// Must be called from within a Tokio runtime.  A no-op while running.
    ///
    /// # Errors
    /// * [`ControllerError::Transport`] if the sink cannot be opened; nothing
    ///   is scheduled.
    /// * [`ControllerError::Scheduler`] if the task cannot be spawned; the sink
    ///   is closed again.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.scheduler.is_running() {
            return Ok(());
        }

        let target = {
            let mut sink = self.sink();
            let opened = sink.start();
            self.connected.store(sink.is_connected(), Ordering::Release);
            opened?;
            sink.target()
        };

        if let Err(e) = self
            .scheduler
            .start(self.orientation.clone(), Arc::clone(&self.sink))
        {
            let mut sink = self.sink();
            sink.stop();
            self.connected.store(sink.is_connected(), Ordering::Release);
            return Err(e.into());
        }

        info!(%target, "platform link started");
        Ok(())
    }

    /// Stop transmitting, then close the sink.
    ///
    /// Waits for an in-flight send to finish; nothing is sent after this
    /// returns.
    pub async fn stop(&mut self) {
        self.scheduler.stop().await;
        let mut sink = self.sink();
        sink.stop();
        self.connected.store(sink.is_connected(), Ordering::Release);
        info!(target = %sink.target(), "platform link stopped");
    }

    /// The sink's connection state as of the last start or stop.  Never
    /// waits for a send in progress.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn target(&self) -> String {
        self.sink().target()
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.scheduler.stats()
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<TickFailure> {
        self.scheduler.subscribe_failures()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
