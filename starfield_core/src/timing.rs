// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame ticks and the draw throttle.
//!
//! The host's frame primitive (e.g. `requestAnimationFrame`) fires at the
//! display rate and delivers a [`FrameTick`] each time. The field's own
//! frame-rate cap is usually lower, so [`FramePacer`] decides per tick
//! whether a draw is due and how much simulated time it covers.
//!
//! Two clocks are kept apart:
//!
//! - the *draw* clock: a draw is due once `1000 / fps` ms have passed since
//!   the previous draw, otherwise the tick is [`PaceDecision::Throttled`].
//!   A tenth of the interval is forgiven, so vsync-aligned ticks whose
//!   timestamps land a microsecond early still draw at the full cap;
//! - the *logical* clock: `dt` is measured since the previous update and
//!   capped at [`MAX_FRAME_DT`] so a stalled tab never produces a large jump.

use crate::output::SurfaceId;
use crate::time::{Duration, HostTime};

/// Length of one normalized simulation step (1/60 s) in milliseconds.
pub const STEP_MS: f64 = 1000.0 / 60.0;

/// Largest `dt` a single update may cover.
pub const MAX_FRAME_DT: Duration = Duration::from_millis(33);

/// A frame opportunity delivered by the host's frame primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Host time when the tick was generated.
    pub now: HostTime,
    /// Monotonically increasing frame counter.
    pub frame_index: u64,
    /// Which surface this tick drives.
    pub surface: SurfaceId,
}

/// What to do with one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaceDecision {
    /// The frame-rate cap has not elapsed; skip all work this tick.
    Throttled,
    /// Update and draw, advancing the simulation by `dt_ms`.
    Draw {
        /// Elapsed logical time in milliseconds, already capped.
        dt_ms: f64,
    },
}

/// Draw throttle for a fixed frame-rate cap.
#[derive(Clone, Copy, Debug)]
pub struct FramePacer {
    fps: u32,
    interval: Duration,
    slack: Duration,
    last_draw: Option<HostTime>,
    last_update: Option<HostTime>,
}

impl FramePacer {
    /// Creates a pacer for the given cap. A cap of zero is treated as one.
    #[must_use]
    pub fn new(fps: u32) -> Self {
        let mut pacer = Self {
            fps: 1,
            interval: Duration::ZERO,
            slack: Duration::ZERO,
            last_draw: None,
            last_update: None,
        };
        pacer.set_fps(fps);
        pacer
    }

    /// Changes the frame-rate cap, keeping the draw history.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.max(1);
        self.interval = Duration::from_millis_f64(1000.0 / f64::from(self.fps));
        self.slack = Duration(self.interval.ticks() / 10);
    }

    /// Returns the current frame-rate cap.
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Returns the minimum time between draws.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decides what to do for a tick at `now`.
    pub fn poll(&mut self, now: HostTime) -> PaceDecision {
        if let Some(last) = self.last_draw
            && now
                .saturating_duration_since(last)
                .saturating_add(self.slack)
                < self.interval
        {
            return PaceDecision::Throttled;
        }
        let dt = self
            .last_update
            .map_or(Duration::ZERO, |last| {
                now.saturating_duration_since(last).min(MAX_FRAME_DT)
            });
        self.last_draw = Some(now);
        self.last_update = Some(now);
        PaceDecision::Draw {
            dt_ms: dt.as_millis_f64(),
        }
    }

    /// Forgets the previous update so the next draw advances by zero.
    ///
    /// Called while paused; resuming continues from the held state.
    pub fn reset(&mut self) {
        self.last_draw = None;
        self.last_update = None;
    }
}
