/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Orientation state for the motion platform.
//!
//! Two types model the two sides of the setter / timer split:
//!
//! ```text
//! application ──set_pitch/set_roll──►  SharedOrientation  ──snapshot()──►  scheduler tick
//!   (any thread)                         Mutex<Orientation>                 (timer task)
//! ```
//!
//! # Safety envelope
//! The platform accepts pitch in `[-15, 21]` degrees and roll in `[-18, 18]`
//! degrees.  Values are clamped when they are **written**, never when they
//! are read, so every stored [`Orientation`] is already inside the envelope.
//!
//! # Consistency
//! Pitch and roll live together behind a single mutex.  A tick therefore
//! always observes a pair that was fully written, never a fresh pitch next to
//! a stale roll from a different update call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Lowest pitch the platform accepts (degrees).
pub const PITCH_MIN: f32 = -15.0;

/// Highest pitch the platform accepts (degrees).
pub const PITCH_MAX: f32 = 21.0;

/// Lowest roll the platform accepts (degrees).
pub const ROLL_MIN: f32 = -18.0;

/// Highest roll the platform accepts (degrees).
pub const ROLL_MAX: f32 = 18.0;

/// Saturate `value` into `[min, max]`.
///
/// NaN has no meaningful position in the range and is mapped to the neutral
/// value `0.0` instead of being rejected.
fn saturate(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// Clamp a pitch value into `[PITCH_MIN, PITCH_MAX]`.
pub fn clamp_pitch(value: f32) -> f32 {
    saturate(value, PITCH_MIN, PITCH_MAX)
}

/// Clamp a roll value into `[ROLL_MIN, ROLL_MAX]`.
pub fn clamp_roll(value: f32) -> f32 {
    saturate(value, ROLL_MIN, ROLL_MAX)
}

/// Wrap an angle in degrees into `(-180, 180]`.
///
/// Game engines usually report Euler angles in `[0, 360)`; a nose-down tilt of
/// 5° shows up as `355`.  The platform wants the signed form.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

// ── Orientation ───────────────────────────────────────────────────────────────

/// One pitch/roll sample, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    /// Build a sample without clamping.
    pub fn new(pitch: f32, roll: f32) -> Self {
        Self { pitch, roll }
    }

    /// Build a sample from engine Euler angles (x = pitch, z = roll) in
    /// `[0, 360)`, wrapping both into the signed range.
    ///
    /// The result is not clamped; the controller clamps on write.
    pub fn from_euler_degrees(x: f32, z: f32) -> Self {
        Self {
            pitch: wrap_degrees(x),
            roll: wrap_degrees(z),
        }
    }

    /// Return a copy saturated into the platform envelope.
    pub fn clamped(self) -> Self {
        Self {
            pitch: clamp_pitch(self.pitch),
            roll: clamp_roll(self.roll),
        }
    }

    /// Returns `true` if both axes are inside the platform envelope.
    pub fn is_within_envelope(&self) -> bool {
        (PITCH_MIN..=PITCH_MAX).contains(&self.pitch) && (ROLL_MIN..=ROLL_MAX).contains(&self.roll)
    }
}

// ── SharedOrientation ─────────────────────────────────────────────────────────

/// Cloneable, thread-safe holder of the current [`Orientation`].
///
/// Every clone refers to the same state.  Writers clamp before storing, so
/// [`snapshot`](Self::snapshot) always returns an in-envelope pair.
#[derive(Debug, Clone, Default)]
pub struct SharedOrientation {
    inner: Arc<Mutex<Orientation>>,
}

impl SharedOrientation {
    /// Creates a holder initialised to the level position `(0, 0)`.
    pub fn new() -> Self {
        Self::default()
    }

    // The guarded value is `Copy` and every writer stores a whole value, so a
    // poisoned lock still holds a consistent pair.
    fn lock(&self) -> MutexGuard<'_, Orientation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a clamped pitch, keeping the current roll.
    pub fn set_pitch(&self, pitch: f32) {
        self.lock().pitch = clamp_pitch(pitch);
    }

    /// Store a clamped roll, keeping the current pitch.
    pub fn set_roll(&self, roll: f32) {
        self.lock().roll = clamp_roll(roll);
    }

    /// Store both axes under one guard.
    pub fn set(&self, orientation: Orientation) {
        *self.lock() = orientation.clamped();
    }

    /// Read the current pair.
    pub fn snapshot(&self) -> Orientation {
        *self.lock()
    }

    pub fn pitch(&self) -> f32 {
        self.lock().pitch
    }

    pub fn roll(&self) -> f32 {
        self.lock().roll
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
