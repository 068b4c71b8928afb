// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-independent core of the decorative starfield effect.
//!
//! `starfield_core` owns everything about the effect that does not touch a
//! browser: the particle arena, the quality policy derived from environment
//! signals, the sprite cache, and frame pacing. It is `no_std` compatible
//! (with `alloc`) so the same code drives a Canvas 2D surface in the browser
//! and the software [`raster`] surface in tests and headless demos.
//!
//! # Architecture
//!
//! ```text
//!   EnvironmentSignals (probed once per mount)
//!       │
//!       ▼
//!   QualityPolicy::resolve() ──► target count, fps cap, buckets, DPR cap
//!       │
//!       ▼
//!   ParticleStore::resize()
//!       │
//!   FrameTick ──► ParticleField::on_frame()
//!                     │  Gate (hidden / offscreen) ──► Paused
//!                     │  FramePacer::poll()        ──► Throttled
//!                     ▼
//!                 ParticleStore::step(dt) ──► SpriteCache::get() ──► Surface::draw_sprite()
//! ```
//!
//! **[`config`]**: [`FieldConfig`](config::FieldConfig), the single set of
//! construction-time options, plus colour and interval types.
//!
//! **[`policy`]**: Environment signals and the derived
//! [`QualityPolicy`](policy::QualityPolicy).
//!
//! **[`particle`]**: Flat particle arena with grow/shrink-from-tail resizing,
//! integration, edge wrapping and triangle-wave twinkle.
//!
//! **[`sprite`]**: Radius bucketing and the append-only glow sprite cache.
//!
//! **[`timing`]**: Frame ticks and the draw throttle.
//!
//! **[`field`]**: The render loop state machine tying it all together.
//!
//! **[`surface`]**: The [`Surface`](surface::Surface) trait platform
//! backends implement.
//!
//! **[`raster`]**: A software RGBA surface for tests and headless use.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod field;
pub mod output;
pub mod particle;
pub mod policy;
pub mod raster;
pub mod sprite;
pub mod surface;
pub mod time;
pub mod timing;
pub mod trace;
