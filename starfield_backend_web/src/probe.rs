// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot capability and preference probe.
//!
//! Every browser query the policy needs is made here, once per mount, and
//! folded into an [`EnvironmentSignals`] value. Several of the queried
//! properties are non-standard (`navigator.deviceMemory`,
//! `navigator.connection.saveData`) so they are read reflectively; anything
//! missing or malformed comes back as "unknown", never as an error.

use js_sys::Reflect;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{EventTarget, MediaQueryList, Navigator, Window};

use starfield_core::policy::EnvironmentSignals;

/// Media query matching a reduced-motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Vendor spellings of `navigator.connection`, in lookup order.
const CONNECTION_KEYS: [&str; 3] = ["connection", "mozConnection", "webkitConnection"];

/// Reads every signal the quality policy consumes.
#[must_use]
pub fn probe_environment(window: &Window) -> EnvironmentSignals {
    let navigator = window.navigator();
    EnvironmentSignals {
        prefers_reduced_motion: reduced_motion_query(window).is_some_and(|q| q.matches()),
        save_data: save_data(&navigator),
        device_memory_gb: get(&navigator, "deviceMemory")
            .and_then(|v| v.as_f64())
            .and_then(positive),
        hardware_concurrency: cores(navigator.hardware_concurrency()),
        device_pixel_ratio: positive(window.device_pixel_ratio()).unwrap_or(1.0),
        document_hidden: window.document().is_some_and(|d| d.hidden()),
        intersection_observer: has_global(window, "IntersectionObserver"),
    }
}

/// Returns the reduced-motion media query list, if `matchMedia` works.
#[must_use]
pub fn reduced_motion_query(window: &Window) -> Option<MediaQueryList> {
    window.match_media(REDUCED_MOTION_QUERY).ok().flatten()
}

/// Returns the network information object, under whichever name the
/// browser exposes it.
#[must_use]
pub fn connection(navigator: &Navigator) -> Option<EventTarget> {
    CONNECTION_KEYS
        .iter()
        .find_map(|key| get(navigator, key))
        .and_then(|v| v.dyn_into::<EventTarget>().ok())
}

/// Reads `connection.saveData`.
#[must_use]
pub fn save_data(navigator: &Navigator) -> Option<bool> {
    let connection = connection(navigator)?;
    get(&connection, "saveData")?.as_bool()
}

/// Returns whether `name` is defined on the global object.
#[must_use]
pub fn has_global(window: &Window, name: &str) -> bool {
    Reflect::has(window, &JsValue::from_str(name)).unwrap_or(false)
        && get(window, name).is_some()
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Keeps finite, strictly positive values.
fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Converts `navigator.hardwareConcurrency` into a core count.
fn cores(v: f64) -> Option<u32> {
    let v = positive(v)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped into u32 range before the cast"
    )]
    let n = libm::floor(v).min(f64::from(u32::MAX)) as u32;
    (n > 0).then_some(n)
}
