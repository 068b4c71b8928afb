// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RAII wrappers for DOM event listeners and observers.
//!
//! Each type owns its JS closure and detaches it when dropped, so tearing
//! down a mounted starfield is just dropping its handles.

use alloc::boxed::Box;

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Element, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry, ResizeObserver};

/// An `addEventListener` registration, removed on drop.
pub struct EventListener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    /// Registers `callback` for `kind` events on `target`.
    pub fn new(
        target: &EventTarget,
        kind: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

impl core::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventListener")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A `ResizeObserver` on one element, disconnected on drop.
pub struct ResizeWatcher {
    observer: ResizeObserver,
    _closure: Closure<dyn FnMut(Array)>,
}

impl ResizeWatcher {
    /// Calls `callback` whenever `element` changes size.
    pub fn new(element: &Element, mut callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |_entries: Array| callback()) as Box<dyn FnMut(Array)>);
        let observer = ResizeObserver::new(closure.as_ref().unchecked_ref())?;
        observer.observe(element);
        Ok(Self {
            observer,
            _closure: closure,
        })
    }
}

impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for ResizeWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeWatcher").finish_non_exhaustive()
    }
}

/// An `IntersectionObserver` on one element, disconnected on drop.
pub struct IntersectionWatcher {
    observer: IntersectionObserver,
    _closure: Closure<dyn FnMut(Array)>,
}

impl IntersectionWatcher {
    /// Calls `callback` with the element's latest intersection state.
    pub fn new(
        element: &Element,
        mut callback: impl FnMut(bool) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |entries: Array| {
            // Entries are in time order; only the newest matters.
            let Some(last) = entries.length().checked_sub(1) else {
                return;
            };
            if let Ok(entry) = entries.get(last).dyn_into::<IntersectionObserverEntry>() {
                callback(entry.is_intersecting());
            }
        }) as Box<dyn FnMut(Array)>);
        let observer = IntersectionObserver::new(closure.as_ref().unchecked_ref())?;
        observer.observe(element);
        Ok(Self {
            observer,
            _closure: closure,
        })
    }
}

impl Drop for IntersectionWatcher {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for IntersectionWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntersectionWatcher").finish_non_exhaustive()
    }
}
