// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for starfield.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`probe_environment`]: one-shot capability and preference probe
//! - [`CanvasSurface`]: Canvas 2D [`Surface`] with offscreen-canvas sprites
//! - [`listeners`]: RAII event listeners and observers
//! - [`Starfield`]: mounts a complete starfield on a `<canvas>`

#![no_std]

extern crate alloc;

mod canvas;
pub mod listeners;
mod mount;
pub mod probe;
mod raf;

pub use canvas::{CanvasSprite, CanvasSurface, backing_size, css_rgba};
pub use mount::Starfield;
pub use probe::{REDUCED_MOTION_QUERY, probe_environment};
pub use raf::RafLoop;
pub use starfield_core::surface::Surface;

use starfield_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}
