// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the starfield loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! field calls as it resolves policy, resizes, builds sprites and handles
//! frames. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use kurbo::Size;

use crate::config::QualityPreset;
use crate::field::{FrameOutcome, LoopState};
use crate::output::SurfaceId;
use crate::policy::{DowngradeReason, QualityPolicy, QualityTier};
use crate::sprite::SpriteKey;
use crate::time::HostTime;
use crate::timing::FrameTick;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted whenever the quality policy is (re)resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyEvent {
    /// Which surface the policy applies to.
    pub surface: SurfaceId,
    /// Preset the caller asked for.
    pub requested: QualityPreset,
    /// Tier actually in effect.
    pub tier: QualityTier,
    /// Why the tier was forced down, if it was.
    pub downgrade: Option<DowngradeReason>,
    /// Effective frame-rate cap.
    pub fps_cap: u32,
    /// Device-pixel-ratio cap.
    pub dpr_cap: f64,
    /// Sprite radius buckets.
    pub sprite_buckets: u8,
    /// Particle count the store is sized to.
    pub target_count: usize,
    /// Twinkle is running.
    pub twinkle_enabled: bool,
    /// Reduced motion is honoured.
    pub reduced_motion: bool,
}

impl PolicyEvent {
    /// Builds an event from a resolved policy and the count it produced.
    #[must_use]
    pub fn new(
        surface: SurfaceId,
        requested: QualityPreset,
        policy: &QualityPolicy,
        target_count: usize,
    ) -> Self {
        Self {
            surface,
            requested,
            tier: policy.tier,
            downgrade: policy.downgrade,
            fps_cap: policy.fps_cap,
            dpr_cap: policy.dpr_cap,
            sprite_buckets: policy.sprite_buckets,
            target_count,
            twinkle_enabled: policy.twinkle_enabled,
            reduced_motion: policy.reduced_motion,
        }
    }
}

/// Emitted when the surface changes size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeEvent {
    /// Which surface was resized.
    pub surface: SurfaceId,
    /// New size in CSS pixels.
    pub size: Size,
    /// Particle count before the resize.
    pub previous_count: usize,
    /// Particle count after the resize.
    pub count: usize,
}

/// Emitted once per delivered tick with what the field did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Which surface this tick drove.
    pub surface: SurfaceId,
    /// Host time of the tick.
    pub now: HostTime,
    /// What happened.
    pub outcome: FrameOutcome,
}

impl FrameEvent {
    /// Pairs a tick with its outcome.
    #[must_use]
    pub fn new(tick: &FrameTick, outcome: FrameOutcome) -> Self {
        Self {
            frame_index: tick.frame_index,
            surface: tick.surface,
            now: tick.now,
            outcome,
        }
    }
}

/// Emitted when the loop changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopStateEvent {
    /// Frame on which the change was observed.
    pub frame_index: u64,
    /// Which surface.
    pub surface: SurfaceId,
    /// Host time of the change.
    pub now: HostTime,
    /// Previous state.
    pub from: LoopState,
    /// New state.
    pub to: LoopState,
}

/// Emitted on a sprite cache miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteEvent {
    /// Which surface built the sprite.
    pub surface: SurfaceId,
    /// Cache key of the new sprite.
    pub key: SpriteKey,
    /// Bitmap side in device pixels.
    pub side: u32,
    /// Cache size after insertion.
    pub cache_len: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the field.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after the quality policy is resolved.
    fn on_policy(&mut self, e: &PolicyEvent) {
        _ = e;
    }

    /// Called after the surface is resized.
    fn on_resize(&mut self, e: &ResizeEvent) {
        _ = e;
    }

    /// Called once per tick.
    fn on_frame(&mut self, e: &FrameEvent) {
        _ = e;
    }

    /// Called when the loop state changes.
    fn on_loop_state(&mut self, e: &LoopStateEvent) {
        _ = e;
    }

    /// Called when a sprite is built.
    fn on_sprite(&mut self, e: &SpriteEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method forwarding to one `TraceSink` method.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident => $sink_fn:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$sink_fn(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`PolicyEvent`].
        policy => on_policy(PolicyEvent)
    );
    forward!(
        /// Emits a [`ResizeEvent`].
        resize => on_resize(ResizeEvent)
    );
    forward!(
        /// Emits a [`FrameEvent`].
        frame => on_frame(FrameEvent)
    );
    forward!(
        /// Emits a [`LoopStateEvent`].
        loop_state => on_loop_state(LoopStateEvent)
    );
    forward!(
        /// Emits a [`SpriteEvent`].
        sprite => on_sprite(SpriteEvent)
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::policy::EnvironmentSignals;

    fn sample_frame() -> FrameEvent {
        FrameEvent {
            frame_index: 42,
            surface: SurfaceId(0),
            now: HostTime(1_000_000),
            outcome: FrameOutcome::Drawn {
                dt_ms: 16.667,
                particles: 100,
            },
        }
    }

    #[test]
    fn frame_event_from_tick() {
        let tick = FrameTick {
            now: HostTime(100),
            frame_index: 7,
            surface: SurfaceId(1),
        };
        let evt = FrameEvent::new(&tick, FrameOutcome::Throttled);
        assert_eq!(evt.frame_index, 7);
        assert_eq!(evt.surface, SurfaceId(1));
        assert_eq!(evt.now, HostTime(100));
        assert_eq!(evt.outcome, FrameOutcome::Throttled);
    }

    #[test]
    fn policy_event_copies_policy() {
        let cfg = FieldConfig::default();
        let policy = QualityPolicy::resolve(&cfg, &EnvironmentSignals::default());
        let evt = PolicyEvent::new(SurfaceId(3), cfg.quality, &policy, 100);
        assert_eq!(evt.tier, QualityTier::High);
        assert_eq!(evt.fps_cap, 60);
        assert_eq!(evt.sprite_buckets, 10);
        assert_eq!(evt.target_count, 100);
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame(&sample_frame());
        sink.on_resize(&ResizeEvent {
            surface: SurfaceId(0),
            size: Size::new(10.0, 10.0),
            previous_count: 16,
            count: 16,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame(&sample_frame());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame(&mut self, e: &FrameEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame(&sample_frame());
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }
}
