// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for starfield
//! diagnostics.
//!
//! This crate provides [`TraceSink`](starfield_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`Fanout`]: forwards every event to two sinks.

pub mod chrome;
pub mod pretty;
pub mod recorder;

use starfield_core::trace::{
    FrameEvent, LoopStateEvent, PolicyEvent, ResizeEvent, SpriteEvent, TraceSink,
};

/// Forwards each event to `A`, then to `B`.
#[derive(Debug, Default)]
pub struct Fanout<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Fanout<A, B> {
    fn on_policy(&mut self, e: &PolicyEvent) {
        self.0.on_policy(e);
        self.1.on_policy(e);
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.0.on_resize(e);
        self.1.on_resize(e);
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        self.0.on_frame(e);
        self.1.on_frame(e);
    }

    fn on_loop_state(&mut self, e: &LoopStateEvent) {
        self.0.on_loop_state(e);
        self.1.on_loop_state(e);
    }

    fn on_sprite(&mut self, e: &SpriteEvent) {
        self.0.on_sprite(e);
        self.1.on_sprite(e);
    }
}
