// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software RGBA surface.
//!
//! [`PixelSurface`] implements [`Surface`] on a premultiplied `f32` RGBA
//! buffer. It has no platform dependencies, so tests and the headless demo
//! run the exact frame path a browser would, then inspect pixels and draw
//! counts.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::sprite::GlowSpec;
use crate::surface::{SpriteFactory, Surface};

/// A glow sprite rasterized into a square coverage mask.
#[derive(Clone, Debug, PartialEq)]
pub struct GlowBitmap {
    side: u32,
    color: [f32; 3],
    coverage: Vec<f32>,
}

impl GlowBitmap {
    /// Paints the radial gradient described by `spec`.
    #[must_use]
    pub fn paint(spec: &GlowSpec) -> Self {
        let side = spec.side.max(1);
        let [r, g, b, a] = spec.color.to_f64();
        let center = f64::from(side) / 2.0;
        let reach = (spec.extent * spec.scale).max(f64::EPSILON);
        let mut coverage = Vec::with_capacity((side * side) as usize);
        for y in 0..side {
            for x in 0..side {
                let dx = f64::from(x) + 0.5 - center;
                let dy = f64::from(y) + 0.5 - center;
                let fraction = libm::sqrt(dx * dx + dy * dy) / reach;
                coverage.push(narrow(GlowSpec::alpha_at(fraction) * a));
            }
        }
        Self {
            side,
            color: [narrow(r), narrow(g), narrow(b)],
            coverage,
        }
    }

    /// Width and height in texels.
    #[must_use]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Straight alpha at a texel, or zero outside the bitmap.
    #[must_use]
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x >= self.side || y >= self.side {
            return 0.0;
        }
        self.coverage[(y * self.side + x) as usize]
    }
}

/// A CPU raster target with premultiplied RGBA pixels.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    scale: f64,
    pixels: Vec<[f32; 4]>,
    draw_calls: usize,
}

impl PixelSurface {
    /// Creates a transparent surface covering `size` CSS pixels at `scale`
    /// device pixels per CSS pixel.
    #[must_use]
    pub fn new(size: Size, scale: f64) -> Self {
        let mut surface = Self {
            width: 0,
            height: 0,
            scale: 1.0,
            pixels: Vec::new(),
            draw_calls: 0,
        };
        surface.resize(size, scale);
        surface
    }

    /// Reallocates the backing store; contents are cleared.
    pub fn resize(&mut self, size: Size, scale: f64) {
        self.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self.width = device_len(size.width, self.scale);
        self.height = device_len(size.height, self.scale);
        self.pixels = vec![[0.0; 4]; (self.width as usize) * (self.height as usize)];
        self.draw_calls = 0;
    }

    /// Backing store width in device pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Backing store height in device pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device pixels per CSS pixel.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Premultiplied RGBA at a device pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y as usize) * (self.width as usize) + x as usize).copied()
    }

    /// Sprite draws since the last [`clear`](Surface::clear).
    #[must_use]
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// Sum of alpha over every pixel; a cheap "how much was drawn" probe.
    #[must_use]
    pub fn total_alpha(&self) -> f64 {
        self.pixels.iter().map(|p| f64::from(p[3])).sum()
    }
}

impl SpriteFactory for PixelSurface {
    type Sprite = GlowBitmap;

    fn build_sprite(&mut self, spec: &GlowSpec) -> GlowBitmap {
        GlowBitmap::paint(spec)
    }
}

impl Surface for PixelSurface {
    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
        self.draw_calls = 0;
    }

    fn draw_sprite(&mut self, sprite: &GlowBitmap, dest: Rect, alpha: f64) {
        self.draw_calls += 1;
        let alpha = narrow(alpha.clamp(0.0, 1.0));
        if alpha <= 0.0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let device = dest.scale_from_origin(self.scale);
        let x0 = clamp_index(device.x0, self.width);
        let x1 = clamp_index(libm::ceil(device.x1), self.width);
        let y0 = clamp_index(device.y0, self.height);
        let y1 = clamp_index(libm::ceil(device.y1), self.height);
        let side = f64::from(sprite.side);
        let [r, g, b] = sprite.color;
        for y in y0..y1 {
            let v = (f64::from(y) + 0.5 - device.y0) / device.height();
            let ty = texel(v, side);
            for x in x0..x1 {
                let u = (f64::from(x) + 0.5 - device.x0) / device.width();
                let a = sprite.coverage(texel(u, side), ty) * alpha;
                if a <= 0.0 {
                    continue;
                }
                let dst = &mut self.pixels[(y as usize) * (self.width as usize) + x as usize];
                let keep = 1.0 - a;
                *dst = [
                    r * a + dst[0] * keep,
                    g * a + dst[1] * keep,
                    b * a + dst[2] * keep,
                    a + dst[3] * keep,
                ];
            }
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "colour channels and coverage are in 0..=1"
)]
fn narrow(v: f64) -> f32 {
    v as f32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "surface dimensions are far below u32::MAX"
)]
fn device_len(css: f64, scale: f64) -> u32 {
    if !css.is_finite() || css <= 0.0 {
        return 0;
    }
    libm::ceil(css * scale).min(f64::from(u32::MAX)) as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped into 0..=len before the cast"
)]
fn clamp_index(v: f64, len: u32) -> u32 {
    libm::floor(v).clamp(0.0, f64::from(len)) as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped into 0..side before the cast"
)]
fn texel(t: f64, side: f64) -> u32 {
    libm::floor(t * side).clamp(0.0, side - 1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rgba8;
    use kurbo::Point;

    #[test]
    fn glow_is_brightest_at_the_centre() {
        let spec = GlowSpec::new(Rgba8::WHITE, 2.0, 1.0);
        let bitmap = GlowBitmap::paint(&spec);
        assert_eq!(bitmap.side(), 8);
        let centre = bitmap.coverage(4, 4);
        let edge = bitmap.coverage(0, 0);
        assert!(centre > 0.75, "centre coverage {centre}");
        assert_eq!(edge, 0.0, "corner is outside the glow");
        assert_eq!(bitmap.coverage(8, 0), 0.0, "out of range");
    }

    #[test]
    fn draw_blends_into_covered_pixels_only() {
        let mut surface = PixelSurface::new(Size::new(20.0, 10.0), 1.0);
        let sprite = surface.build_sprite(&GlowSpec::new(Rgba8::WHITE, 1.0, 1.0));
        let dest = Rect::from_center_size(Point::new(5.0, 5.0), Size::new(4.0, 4.0));
        surface.draw_sprite(&sprite, dest, 0.5);

        assert_eq!(surface.draw_calls(), 1);
        let lit = surface.pixel(5, 5).unwrap();
        assert!(lit[3] > 0.0 && lit[3] <= 0.5, "alpha {}", lit[3]);
        assert_eq!(surface.pixel(15, 5), Some([0.0; 4]), "far pixel untouched");
        assert_eq!(surface.pixel(20, 0), None);

        surface.clear();
        assert_eq!(surface.draw_calls(), 0);
        assert_eq!(surface.total_alpha(), 0.0);
    }

    #[test]
    fn draws_are_clipped_to_the_surface() {
        let mut surface = PixelSurface::new(Size::new(8.0, 8.0), 2.0);
        assert_eq!((surface.width(), surface.height()), (16, 16));
        let sprite = surface.build_sprite(&GlowSpec::new(Rgba8::WHITE, 1.0, 2.0));
        let dest = Rect::from_center_size(Point::new(-1.0, 9.0), Size::new(4.0, 4.0));
        surface.draw_sprite(&sprite, dest, 1.0);
        assert!(surface.total_alpha() > 0.0, "partially visible");
        surface.draw_sprite(&sprite, dest + kurbo::Vec2::new(-100.0, 0.0), 1.0);
        assert_eq!(surface.draw_calls(), 2, "off-surface draws still count");
    }
}
