// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: a JS-facing starfield API on top of `starfield_backend_web`.
//!
//! ```js
//! import init, { StarfieldOptions, StarfieldHandle } from "./pkg/web_starfield.js";
//! await init();
//! const opts = new StarfieldOptions();
//! opts.count = 140;
//! opts.setColors(["#ffffff", "#93c5fd"]);
//! opts.setQuality("balanced");
//! const field = StarfieldHandle.mount(document.querySelector("canvas"), opts);
//! // later
//! field.unmount();
//! ```
//!
//! Build with: `wasm-pack build --target web demos/web_starfield`
//!
//! Option strings that fail to parse are reported as thrown JS errors; the
//! option keeps its previous value.

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::string::{String, ToString as _};
use alloc::vec::Vec;

use js_sys::Array;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use starfield_backend_web::Starfield;
use starfield_core::config::{ConfigError, DprCap, FieldConfig, Interval, QualityPreset};
use starfield_core::policy::QualityTier;

fn config_error(e: ConfigError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Options for [`StarfieldHandle::mount`], starting from the defaults.
#[wasm_bindgen]
#[derive(Clone, Debug, Default)]
pub struct StarfieldOptions {
    config: FieldConfig,
}

#[wasm_bindgen]
impl StarfieldOptions {
    /// Default options.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired particle count at 1280×720.
    #[wasm_bindgen(setter)]
    pub fn set_count(&mut self, count: u32) {
        self.config.count = count;
    }

    /// Multiplier on every drawn alpha.
    #[wasm_bindgen(setter)]
    pub fn set_opacity(&mut self, opacity: f64) {
        self.config.opacity = opacity;
    }

    /// Whether particle alpha pulses.
    #[wasm_bindgen(setter)]
    pub fn set_twinkle(&mut self, twinkle: bool) {
        self.config.twinkle = twinkle;
    }

    /// Alpha change per 60 Hz step while twinkling.
    #[wasm_bindgen(setter = twinkleRate)]
    pub fn set_twinkle_rate(&mut self, rate: f64) {
        self.config.twinkle_rate = rate;
    }

    /// Pause while the tab is hidden or the canvas is off-screen.
    #[wasm_bindgen(setter = pauseWhenHidden)]
    pub fn set_pause_when_hidden(&mut self, pause: bool) {
        self.config.pause_when_hidden = pause;
    }

    /// Pause while the tab is hidden.
    #[wasm_bindgen(setter = pauseOnTabHidden)]
    pub fn set_pause_on_tab_hidden(&mut self, pause: bool) {
        self.config.pause_on_tab_hidden = pause;
    }

    /// Frame-rate cap; the quality tier may lower it.
    #[wasm_bindgen(setter = maxFps)]
    pub fn set_max_fps(&mut self, fps: u32) {
        self.config.max_fps = fps;
    }

    /// Scale the particle count with canvas area.
    #[wasm_bindgen(setter = scaleWithArea)]
    pub fn set_scale_with_area(&mut self, scale: bool) {
        self.config.scale_with_area = scale;
    }

    /// Let low-memory or low-core devices force the battery tier.
    #[wasm_bindgen(setter = adaptiveQuality)]
    pub fn set_adaptive_quality(&mut self, adaptive: bool) {
        self.config.adaptive_quality = adaptive;
    }

    /// Let the data-saver hint force the battery tier.
    #[wasm_bindgen(setter = respectDataSaver)]
    pub fn set_respect_data_saver(&mut self, respect: bool) {
        self.config.respect_data_saver = respect;
    }

    /// Mark the canvas decorative for assistive technology.
    #[wasm_bindgen(setter = ariaHidden)]
    pub fn set_aria_hidden(&mut self, hidden: bool) {
        self.config.aria_hidden = hidden;
    }

    /// Distance past an edge before a particle re-enters opposite.
    #[wasm_bindgen(setter = wrapMargin)]
    pub fn set_wrap_margin(&mut self, margin: f64) {
        self.config.wrap_margin = margin;
    }

    /// Particle radius range in CSS pixels.
    #[wasm_bindgen(js_name = setRadius)]
    pub fn set_radius(&mut self, min: f64, max: f64) {
        self.config.radius = Interval::new(min, max);
    }

    /// Speed ranges in pixels per 60 Hz step.
    #[wasm_bindgen(js_name = setVelocity)]
    pub fn set_velocity(&mut self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
        self.config.velocity_x = Interval::new(x_min, x_max);
        self.config.velocity_y = Interval::new(y_min, y_max);
    }

    /// Palette as an array of hex strings; empty restores the default.
    #[wasm_bindgen(js_name = setColors)]
    pub fn set_colors(&mut self, colors: &Array) -> Result<(), JsValue> {
        let colors: Vec<String> = colors
            .iter()
            .map(|c| c.as_string().ok_or(ConfigError::InvalidColor))
            .collect::<Result<_, _>>()
            .map_err(config_error)?;
        let colors: Vec<&str> = colors.iter().map(String::as_str).collect();
        self.config = self
            .config
            .clone()
            .with_palette_str(&colors)
            .map_err(config_error)?;
        Ok(())
    }

    /// `"high"`, `"balanced"` or `"battery"`.
    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&mut self, quality: &str) -> Result<(), JsValue> {
        self.config.quality = quality.parse::<QualityPreset>().map_err(config_error)?;
        Ok(())
    }

    /// `"auto"` or a positive number.
    #[wasm_bindgen(js_name = setDprCap)]
    pub fn set_dpr_cap(&mut self, cap: &str) -> Result<(), JsValue> {
        self.config.dpr_cap = cap.parse::<DprCap>().map_err(config_error)?;
        Ok(())
    }
}

/// A running starfield. Call `unmount()` (or `free()`) to stop it.
#[wasm_bindgen]
#[derive(Debug)]
pub struct StarfieldHandle {
    inner: Option<Starfield>,
}

#[wasm_bindgen]
impl StarfieldHandle {
    /// Starts a starfield on `canvas`.
    pub fn mount(
        canvas: HtmlCanvasElement,
        options: &StarfieldOptions,
    ) -> Result<StarfieldHandle, JsValue> {
        Ok(Self {
            inner: Some(Starfield::mount(canvas, &options.config)?),
        })
    }

    /// Mounts an independent starfield on every canvas matching `selector`.
    #[wasm_bindgen(js_name = mountAll)]
    pub fn mount_all(selector: &str, options: &StarfieldOptions) -> Result<Array, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let nodes = document.query_selector_all(selector)?;
        let handles = Array::new();
        for i in 0..nodes.length() {
            let Some(canvas) = nodes
                .item(i)
                .and_then(|n| n.dyn_into::<HtmlCanvasElement>().ok())
            else {
                continue;
            };
            handles.push(&Self::mount(canvas, options)?.into());
        }
        Ok(handles)
    }

    /// Stops the loop and detaches every listener. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(field) = self.inner.take() {
            field.unmount();
        }
    }

    /// Whether the frame loop is scheduled.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn running(&self) -> bool {
        self.inner.as_ref().is_some_and(Starfield::is_running)
    }

    /// Current particle count, 0 after unmount.
    #[wasm_bindgen(getter = particleCount)]
    #[must_use]
    pub fn particle_count(&self) -> u32 {
        let n = self.inner.as_ref().map_or(0, Starfield::particle_count);
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Effective quality tier, if mounted.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn tier(&self) -> Option<String> {
        let policy = self.inner.as_ref()?.policy()?;
        let name = match policy.tier {
            QualityTier::High => "high",
            QualityTier::Balanced => "balanced",
            QualityTier::Battery => "battery",
        };
        Some(name.to_string())
    }

    /// Whether off-screen pausing is active.
    #[wasm_bindgen(getter = watchesVisibility)]
    #[must_use]
    pub fn watches_visibility(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(Starfield::watches_visibility)
    }
}
