// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing contract for platform integrations.
//!
//! The field never talks to a canvas directly. Platform code provides the
//! following pieces:
//!
//! - **Tick source**: produces [`FrameTick`] values from the host's frame
//!   primitive (e.g. `requestAnimationFrame`). The setup and lifecycle differ
//!   too much across hosts to share a trait.
//!
//! - **Environment probe**: a one-shot function filling in
//!   [`EnvironmentSignals`].
//!
//! - **Surface**: implements [`Surface`] (and so [`SpriteFactory`]) to paint
//!   glow sprites and blit them each frame.
//!
//! `starfield_core` ships [`PixelSurface`], a software implementation used
//! by tests and the headless demo.
//!
//! [`FrameTick`]: crate::timing::FrameTick
//! [`EnvironmentSignals`]: crate::policy::EnvironmentSignals
//! [`PixelSurface`]: crate::raster::PixelSurface

use kurbo::Rect;

use crate::sprite::GlowSpec;

/// Builds backend sprites for the [`SpriteCache`](crate::sprite::SpriteCache).
pub trait SpriteFactory {
    /// Backend handle for one pre-rendered sprite.
    type Sprite;

    /// Paints a radial glow as described by `spec`.
    fn build_sprite(&mut self, spec: &GlowSpec) -> Self::Sprite;
}

/// A 2D surface the field draws into once per drawn frame.
///
/// # Frame pseudocode
///
/// ```rust,ignore
/// surface.clear();
/// for particle in store.particles() {
///     let sprite = cache.get(particle.color, particle.radius, buckets, surface);
///     let dest = Rect::from_center_size(particle.position, sprite_size);
///     surface.draw_sprite(&sprite, dest, particle.alpha * opacity);
/// }
/// ```
pub trait Surface: SpriteFactory {
    /// Clears the whole surface to transparent.
    fn clear(&mut self);

    /// Draws `sprite` stretched over `dest` (CSS pixels) with global `alpha`.
    fn draw_sprite(&mut self, sprite: &Self::Sprite, dest: Rect, alpha: f64);
}
