/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic frame transmission.
//!
//! [`TransmissionScheduler`] owns one Tokio task that, on every tick, reads
//! the current [`Orientation`](crate::orientation::Orientation), encodes a
//! frame and hands it to the sink.
//!
//! ```text
//!            start()                        stop()
//!  Stopped ───────────►  Running  ──────────────────► Stopped
//!                         │  ▲
//!                interval │  │ frame sent / failure broadcast
//!                 tick    ▼  │
//!              snapshot → encode → spawn_blocking(send)
//! ```
//!
//! # Decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Timer | `tokio::time::interval`, missed ticks are delayed, never bursted |
//! | Blocking sends | `spawn_blocking`, so a stalled serial write never holds a runtime worker |
//! | Send failure | Frame dropped, failure broadcast + `warn!`, next tick proceeds |
//! | Stop | Signal, then await the task: an in-flight tick completes, nothing is sent after `stop()` returns |
//! | Re-entrant start | No-op while running |
//! | Drop | Dropping the scheduler drops the stop sender, which ends the task |

pub mod error;

pub use error::{SchedulerError, TickFailure};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::orientation::SharedOrientation;
use crate::protocol::FrameEncoder;
use crate::transport::TransportSink;

// ── Constants ─────────────────────────────────────────────────────────────────

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Failures older than this are dropped for slow subscribers (they see
/// `RecvError::Lagged`).
const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// A sink shared between its owner and the scheduler task.
pub type SharedSink = Arc<Mutex<Box<dyn TransportSink>>>;

// ── Statistics ────────────────────────────────────────────────────────────────

/// Live counters, updated by the scheduler task.
#[derive(Debug, Default)]
pub struct TransmissionStats {
    ticks: AtomicU64,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    send_failures: AtomicU64,
}

impl TransmissionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TransmissionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub frames_sent: u64,
    /// Wire bytes, escapes included.
    pub bytes_sent: u64,
    pub send_failures: u64,
}

// ── Tick worker ───────────────────────────────────────────────────────────────

/// Everything one tick needs, moved into the task.
struct TickContext {
    encoder: FrameEncoder,
    orientation: SharedOrientation,
    sink: SharedSink,
    stats: Arc<TransmissionStats>,
    failures: broadcast::Sender<TickFailure>,
}

impl TickContext {
    async fn tick(&self) {
        let tick = self.stats.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let orientation = self.orientation.snapshot();
        let frame = self.encoder.encode(orientation);
        trace!(
            tick,
            pitch = orientation.pitch,
            roll = orientation.roll,
            bytes = ?frame.as_bytes(),
            "frame built"
        );

        let sink = Arc::clone(&self.sink);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            sink.send(frame.as_bytes()).map(|()| frame.len())
        })
        .await;

        match outcome {
            Ok(Ok(len)) => {
                self.stats.frames_sent.fetch_add(1, Ordering::Relaxed);
                self.stats.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
            }
            Ok(Err(e)) => self.report(tick, format!("{:#}", anyhow::Error::new(e))),
            Err(e) => self.report(tick, format!("send task failed: {e}")),
        }
    }

    fn report(&self, tick: u64, reason: String) {
        self.stats.send_failures.fetch_add(1, Ordering::Relaxed);
        warn!(tick, error = %reason, "send failed, frame dropped");
        // No subscribers is not an error.
        let _ = self.failures.send(TickFailure { tick, reason });
    }
}

async fn run(ctx: TickContext, period: Duration, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Resolves on an explicit stop and when the sender is dropped.
            _ = &mut stop_rx => break,
            _ = ticker.tick() => ctx.tick().await,
        }
    }
    debug!("transmission task exited");
}

// ── TransmissionScheduler ─────────────────────────────────────────────────────

struct Running {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct TransmissionScheduler {
    interval: Duration,
    encoder: FrameEncoder,
    stats: Arc<TransmissionStats>,
    failures: broadcast::Sender<TickFailure>,
    running: Option<Running>,
}

impl TransmissionScheduler {
    pub fn new(interval: Duration, encoder: FrameEncoder) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            interval,
            encoder,
            stats: Arc::new(TransmissionStats::default()),
            failures,
            running: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the periodic task on the current Tokio runtime.
    ///
    /// A no-op while already running.  The first frame is sent immediately,
    /// then one per interval.
    ///
    /// # Errors
    /// [`SchedulerError::ZeroInterval`] or [`SchedulerError::NoRuntime`]; in
    /// both cases nothing was spawned.
    pub fn start(
        &mut self,
        orientation: SharedOrientation,
        sink: SharedSink,
    ) -> Result<(), SchedulerError> {
        if self.is_running() {
            debug!("scheduler already running, start ignored");
            return Ok(());
        }
        if self.interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let ctx = TickContext {
            encoder: self.encoder,
            orientation,
            sink,
            stats: Arc::clone(&self.stats),
            failures: self.failures.clone(),
        };
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = runtime.spawn(run(ctx, self.interval, stop_rx));

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "transmission scheduler started"
        );
        self.running = Some(Running { stop_tx, handle });
        Ok(())
    }

    /// Stop scheduling ticks and wait for the task to finish.
    ///
    /// A tick already in progress (including its blocking send) completes
    /// first; no send begins after this returns.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // Err means the task is already gone; joining below reports why.
        let _ = running.stop_tx.send(());
        if let Err(e) = running.handle.await {
            warn!(error = %e, "transmission task ended abnormally");
        }

        let stats = self.stats.snapshot();
        info!(
            ticks = stats.ticks,
            frames_sent = stats.frames_sent,
            send_failures = stats.send_failures,
            "transmission scheduler stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Receive a [`TickFailure`] for every dropped frame from now on.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<TickFailure> {
        self.failures.subscribe()
    }
}

impl Default for TransmissionScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, FrameEncoder::new())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;
    use crate::protocol::{decode_frame, Markers};
    use crate::transport::testing::{Recorder, RecordingSink};
    use crate::transport::TransportError;

    fn shared(sink: impl TransportSink + 'static) -> SharedSink {
        let sink: Box<dyn TransportSink> = Box::new(sink);
        Arc::new(Mutex::new(sink))
    }

    fn recording() -> (SharedSink, Recorder) {
        let (sink, recorder) = RecordingSink::new();
        (shared(sink), recorder)
    }

    fn decoded(frame: &[u8]) -> Orientation {
        decode_frame(frame, &Markers::DEFAULT).unwrap().orientation
    }

    // ── Cadence ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn emits_one_frame_per_interval() {
        let (sink, recorder) = recording();
        let orientation = SharedOrientation::new();
        orientation.set(Orientation::new(10.0, -5.0));

        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(50), FrameEncoder::new());
        scheduler.start(orientation, sink).unwrap();
        time::sleep(Duration::from_millis(525)).await;
        scheduler.stop().await;

        // Ticks at 0, 50, ..., 500 ms: 11 nominal.
        let frames = recorder.frames();
        assert!(
            (7..=13).contains(&frames.len()),
            "expected ~11 frames, got {}",
            frames.len()
        );
        for frame in &frames {
            assert_eq!(decoded(frame), Orientation::new(10.0, -5.0));
        }

        let stats = scheduler.stats();
        assert_eq!(stats.frames_sent, frames.len() as u64);
        assert_eq!(stats.ticks, stats.frames_sent);
        assert_eq!(
            stats.bytes_sent,
            frames.iter().map(|f| f.len() as u64).sum::<u64>()
        );
    }

    #[tokio::test]
    async fn no_frames_before_start_or_after_stop() {
        let (sink, recorder) = recording();
        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(20), FrameEncoder::new());

        time::sleep(Duration::from_millis(80)).await;
        assert_eq!(recorder.frame_count(), 0);
        assert!(!scheduler.is_running());

        scheduler.start(SharedOrientation::new(), sink).unwrap();
        assert!(scheduler.is_running());
        time::sleep(Duration::from_millis(100)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());

        let sent = recorder.frame_count();
        assert!(sent >= 1);
        time::sleep(Duration::from_millis(120)).await;
        assert_eq!(recorder.frame_count(), sent);
    }

    #[tokio::test]
    async fn ticks_follow_latest_orientation() {
        let (sink, recorder) = recording();
        let orientation = SharedOrientation::new();
        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(20), FrameEncoder::new());

        scheduler.start(orientation.clone(), sink).unwrap();
        time::sleep(Duration::from_millis(60)).await;
        orientation.set(Orientation::new(21.0, -18.0));
        time::sleep(Duration::from_millis(60)).await;
        scheduler.stop().await;

        let frames = recorder.frames();
        assert_eq!(decoded(&frames[0]), Orientation::new(0.0, 0.0));
        assert_eq!(
            decoded(frames.last().unwrap()),
            Orientation::new(21.0, -18.0)
        );
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_twice_does_not_double_schedule() {
        let (sink, recorder) = recording();
        let orientation = SharedOrientation::new();
        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(100), FrameEncoder::new());

        scheduler.start(orientation.clone(), Arc::clone(&sink)).unwrap();
        scheduler.start(orientation, sink).unwrap();
        time::sleep(Duration::from_millis(350)).await;
        scheduler.stop().await;

        // One schedule gives 4 (0, 100, 200, 300 ms); two would give 8.
        let n = recorder.frame_count();
        assert!((2..=5).contains(&n), "got {n} frames");
    }

    #[tokio::test]
    async fn can_restart_after_stop() {
        let (sink, recorder) = recording();
        let orientation = SharedOrientation::new();
        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(20), FrameEncoder::new());

        scheduler.start(orientation.clone(), Arc::clone(&sink)).unwrap();
        time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;
        let first = recorder.frame_count();

        scheduler.start(orientation, sink).unwrap();
        time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;
        assert!(recorder.frame_count() > first);
    }

    #[tokio::test]
    async fn stop_when_not_running_is_a_noop() {
        let mut scheduler = TransmissionScheduler::default();
        scheduler.stop().await;
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.interval(), DEFAULT_INTERVAL);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (sink, _) = recording();
        let mut scheduler = TransmissionScheduler::new(Duration::ZERO, FrameEncoder::new());
        assert_eq!(
            scheduler.start(SharedOrientation::new(), sink),
            Err(SchedulerError::ZeroInterval)
        );
        assert!(!scheduler.is_running());
    }

    #[test]
    fn start_outside_runtime_fails() {
        let (sink, _) = recording();
        let mut scheduler = TransmissionScheduler::default();
        assert_eq!(
            scheduler.start(SharedOrientation::new(), sink),
            Err(SchedulerError::NoRuntime)
        );
        assert!(!scheduler.is_running());
    }

    /// Sink whose every send blocks for a while before recording.
    struct SlowSink {
        delay: Duration,
        recorder: Recorder,
    }

    impl TransportSink for SlowSink {
        fn start(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn stop(&mut self) {}

        fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            std::thread::sleep(self.delay);
            self.recorder.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn target(&self) -> String {
            "slow sink".to_string()
        }
    }

    #[tokio::test]
    async fn stop_waits_for_in_flight_send() {
        let recorder = Recorder::default();
        let sink = shared(SlowSink {
            delay: Duration::from_millis(150),
            recorder: recorder.clone(),
        });
        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(20), FrameEncoder::new());

        scheduler.start(SharedOrientation::new(), sink).unwrap();
        // The first tick fires immediately and is now blocked in send.
        time::sleep(Duration::from_millis(30)).await;
        scheduler.stop().await;

        let sent = recorder.frame_count();
        assert_eq!(sent, 1, "in-flight send must complete before stop returns");
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(recorder.frame_count(), sent);
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn send_failures_are_broadcast_and_ticking_continues() {
        let (sink, recorder) = recording();
        recorder.set_fail_sends(true);

        let mut scheduler = TransmissionScheduler::new(Duration::from_millis(20), FrameEncoder::new());
        let mut failures = scheduler.subscribe_failures();
        scheduler.start(SharedOrientation::new(), sink).unwrap();

        let first = time::timeout(Duration::from_secs(2), failures.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.tick, 1);
        assert!(first.reason.contains("recording sink"), "{}", first.reason);
        assert!(first.reason.contains("injected"), "{}", first.reason);

        recorder.set_fail_sends(false);
        time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.is_running());
        scheduler.stop().await;

        let stats = scheduler.stats();
        assert!(stats.send_failures >= 1);
        assert!(stats.frames_sent >= 1);
        assert_eq!(stats.ticks, stats.frames_sent + stats.send_failures);
        assert_eq!(recorder.frame_count() as u64, stats.frames_sent);
    }

    #[test]
    fn stats_snapshot_reads_counters() {
        let stats = TransmissionStats::default();
        stats.ticks.fetch_add(3, Ordering::Relaxed);
        stats.frames_sent.fetch_add(2, Ordering::Relaxed);
        stats.bytes_sent.fetch_add(38, Ordering::Relaxed);
        stats.send_failures.fetch_add(1, Ordering::Relaxed);
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                ticks: 3,
                frames_sent: 2,
                bytes_sent: 38,
                send_failures: 1
            }
        );
    }
}
