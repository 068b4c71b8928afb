// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas 2D surface.
//!
//! [`CanvasSurface`] implements [`Surface`] on a `<canvas>` element. Glow
//! sprites are small offscreen canvases painted once with a radial gradient;
//! each frame blits them with `drawImage` under a per-particle global alpha.
//!
//! Drawing calls that the browser rejects are ignored: a failed blit costs
//! one particle for one frame.

use alloc::format;
use alloc::string::String;

use kurbo::{Rect, Size};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use starfield_core::config::Rgba8;
use starfield_core::sprite::{GLOW_STOPS, GlowSpec};
use starfield_core::surface::{SpriteFactory, Surface};

/// A pre-rendered glow, or `None` if the browser refused to create it.
#[derive(Clone, Debug)]
pub struct CanvasSprite(Option<HtmlCanvasElement>);

impl CanvasSprite {
    /// The offscreen canvas, if one was created.
    #[must_use]
    pub fn canvas(&self) -> Option<&HtmlCanvasElement> {
        self.0.as_ref()
    }
}

/// A visible `<canvas>` with its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    document: Document,
    size: Size,
    dpr: f64,
}

impl core::fmt::Debug for CanvasSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasSurface")
            .field("canvas", &"HtmlCanvasElement")
            .field("size", &self.size)
            .field("dpr", &self.dpr)
            .finish_non_exhaustive()
    }
}

impl CanvasSurface {
    /// Acquires the 2D context of `canvas`.
    ///
    /// With `aria_hidden`, the canvas is marked decorative
    /// (`aria-hidden="true"`, `role="presentation"`).
    pub fn new(canvas: HtmlCanvasElement, aria_hidden: bool) -> Result<Self, JsValue> {
        let document = canvas
            .owner_document()
            .ok_or_else(|| JsValue::from_str("canvas has no owner document"))?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        if aria_hidden {
            canvas.set_attribute("aria-hidden", "true")?;
            canvas.set_attribute("role", "presentation")?;
        }
        Ok(Self {
            canvas,
            ctx,
            document,
            size: Size::ZERO,
            dpr: 1.0,
        })
    }

    /// Measures the canvas's laid-out size in CSS pixels.
    #[must_use]
    pub fn css_size(&self) -> Size {
        let rect = self.canvas.get_bounding_client_rect();
        Size::new(rect.width().max(0.0), rect.height().max(0.0))
    }

    /// Sizes the backing store for `size` CSS pixels at `dpr`.
    pub fn resize(&mut self, size: Size, dpr: f64) {
        let (w, h) = backing_size(size, dpr);
        if self.canvas.width() != w {
            self.canvas.set_width(w);
        }
        if self.canvas.height() != h {
            self.canvas.set_height(h);
        }
        self.size = size;
        self.dpr = dpr;
    }

    /// The element drawn into.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Last size passed to [`resize`](Self::resize).
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    fn paint_glow(&self, spec: &GlowSpec) -> Result<HtmlCanvasElement, JsValue> {
        let sprite: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
        sprite.set_width(spec.side);
        sprite.set_height(spec.side);
        let ctx = sprite
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let c = f64::from(spec.side) / 2.0;
        let gradient = ctx.create_radial_gradient(c, c, 0.0, c, c, c)?;
        for (offset, alpha) in GLOW_STOPS {
            gradient.add_color_stop(stop_offset(offset), &css_rgba(spec.color, alpha))?;
        }
        ctx.set_fill_style_canvas_gradient(&gradient);
        let side = f64::from(spec.side);
        ctx.fill_rect(0.0, 0.0, side, side);
        Ok(sprite)
    }
}

impl SpriteFactory for CanvasSurface {
    type Sprite = CanvasSprite;

    fn build_sprite(&mut self, spec: &GlowSpec) -> CanvasSprite {
        CanvasSprite(self.paint_glow(spec).ok())
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self) {
        let _ = self.ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
        self.ctx.set_global_alpha(1.0);
        self.ctx
            .clear_rect(0.0, 0.0, self.size.width, self.size.height);
    }

    fn draw_sprite(&mut self, sprite: &CanvasSprite, dest: Rect, alpha: f64) {
        let Some(image) = sprite.canvas() else {
            return;
        };
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
        let _ = self
            .ctx
            .draw_image_with_html_canvas_element_and_dw_and_dh(
                image,
                dest.x0,
                dest.y0,
                dest.width(),
                dest.height(),
            );
    }
}

/// Backing-store dimensions in device pixels, at least 1×1.
#[must_use]
pub fn backing_size(size: Size, dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    (device_px(size.width * dpr), device_px(size.height * dpr))
}

/// Formats a palette colour with its alpha scaled by `alpha`.
#[must_use]
pub fn css_rgba(color: Rgba8, alpha: f64) -> String {
    let a = f64::from(color.a) / 255.0 * alpha.clamp(0.0, 1.0);
    format!("rgba({}, {}, {}, {a:.3})", color.r, color.g, color.b)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped into u32 range before the cast"
)]
fn device_px(v: f64) -> u32 {
    if !v.is_finite() {
        return 1;
    }
    libm::round(v).clamp(1.0, f64::from(u32::MAX)) as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "gradient stop offsets are in 0..=1"
)]
fn stop_offset(v: f64) -> f32 {
    v as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_scales_by_dpr() {
        assert_eq!(backing_size(Size::new(640.0, 360.0), 2.0), (1280, 720));
        assert_eq!(backing_size(Size::new(100.4, 50.6), 1.0), (100, 51));
        assert_eq!(backing_size(Size::ZERO, 1.5), (1, 1), "never zero-sized");
        assert_eq!(backing_size(Size::new(10.0, 10.0), f64::NAN), (10, 10));
    }

    #[test]
    fn rgba_strings() {
        assert_eq!(css_rgba(Rgba8::WHITE, 1.0), "rgba(255, 255, 255, 1.000)");
        assert_eq!(
            css_rgba(Rgba8::rgb(0x93, 0xc5, 0xfd), 0.6),
            "rgba(147, 197, 253, 0.600)"
        );
        assert_eq!(css_rgba(Rgba8::WHITE, 0.0), "rgba(255, 255, 255, 0.000)");
    }
}
