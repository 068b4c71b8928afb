// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use starfield_core::field::{FrameOutcome, LoopState};
use starfield_core::policy::DowngradeReason;
use starfield_core::trace::{
    FrameEvent, LoopStateEvent, PolicyEvent, ResizeEvent, SpriteEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Print throttled and paused frames too.
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also print frames that were throttled or paused.
    ///
    /// Off by default: at 60 Hz with a 24 fps cap most ticks are throttled.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn state_name(state: LoopState) -> &'static str {
    match state {
        LoopState::Scheduled => "scheduled",
        LoopState::Running => "running",
        LoopState::Paused => "paused",
    }
}

fn downgrade_name(reason: Option<DowngradeReason>) -> &'static str {
    match reason {
        None => "none",
        Some(DowngradeReason::LowEndDevice) => "low-end-device",
        Some(DowngradeReason::DataSaver) => "data-saver",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_policy(&mut self, e: &PolicyEvent) {
        let _ = writeln!(
            self.writer,
            "[policy] surface={} requested={} tier={:?} downgrade={} fps={} dpr_cap={:.2} \
             buckets={} count={} twinkle={} reduced_motion={}",
            e.surface.0,
            e.requested.as_str(),
            e.tier,
            downgrade_name(e.downgrade),
            e.fps_cap,
            e.dpr_cap,
            e.sprite_buckets,
            e.target_count,
            e.twinkle_enabled,
            e.reduced_motion,
        );
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        let _ = writeln!(
            self.writer,
            "[resize] surface={} size={}x{} count={}->{}",
            e.surface.0, e.size.width, e.size.height, e.previous_count, e.count,
        );
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        let now = e.now.as_millis_f64();
        let _ = match e.outcome {
            FrameOutcome::Drawn { dt_ms, particles } => writeln!(
                self.writer,
                "[frame] frame={} surface={} now={now:.1}ms dt={dt_ms:.2}ms particles={particles}",
                e.frame_index, e.surface.0,
            ),
            FrameOutcome::Throttled if self.verbose => writeln!(
                self.writer,
                "[frame] frame={} surface={} now={now:.1}ms throttled",
                e.frame_index, e.surface.0,
            ),
            FrameOutcome::Paused if self.verbose => writeln!(
                self.writer,
                "[frame] frame={} surface={} now={now:.1}ms paused",
                e.frame_index, e.surface.0,
            ),
            FrameOutcome::Throttled | FrameOutcome::Paused => Ok(()),
        };
    }

    fn on_loop_state(&mut self, e: &LoopStateEvent) {
        let _ = writeln!(
            self.writer,
            "[loop] frame={} surface={} now={:.1}ms {} -> {}",
            e.frame_index,
            e.surface.0,
            e.now.as_millis_f64(),
            state_name(e.from),
            state_name(e.to),
        );
    }

    fn on_sprite(&mut self, e: &SpriteEvent) {
        let _ = writeln!(
            self.writer,
            "[sprite] surface={} color={:?} bucket={}/{} side={}px cached={}",
            e.surface.0,
            e.key.color,
            e.key.bucket,
            e.key.bucket_count,
            e.side,
            e.cache_len,
        );
    }
}
