// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mounting a starfield on a `<canvas>`.
//!
//! [`Starfield::mount`] wires everything together:
//!
//! 1. probe the environment once,
//! 2. build the [`ParticleField`] and size the canvas backing store,
//! 3. attach listeners (visibility, reduced motion, data saver) and
//!    observers (resize, intersection) where the browser supports them,
//! 4. start the `requestAnimationFrame` loop.
//!
//! Dropping the returned handle (or calling [`Starfield::unmount`]) cancels
//! the pending frame, disconnects the observers and removes the listeners
//! before returning. Nothing survives an unmount.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlCanvasElement, Window};

use starfield_core::config::FieldConfig;
use starfield_core::field::{LoopState, ParticleField};
use starfield_core::output::SurfaceId;
use starfield_core::policy::QualityPolicy;
use starfield_core::trace::Tracer;

use crate::canvas::{CanvasSprite, CanvasSurface};
use crate::listeners::{EventListener, IntersectionWatcher, ResizeWatcher};
use crate::probe;
use crate::raf::RafLoop;

static NEXT_SURFACE: AtomicU32 = AtomicU32::new(0);

/// Per-mount state shared between the frame loop and the listeners.
struct Mounted {
    field: ParticleField<CanvasSprite>,
    surface: CanvasSurface,
}

impl Mounted {
    fn resize(&mut self) {
        let size = self.surface.css_size();
        if size == self.field.size() {
            return;
        }
        self.field.resize(size, &mut Tracer::none());
        self.surface.resize(size, self.field.effective_dpr());
    }
}

type Shared = Rc<RefCell<Mounted>>;

/// Runs `f` on the shared state unless it is already borrowed.
fn with_mounted(shared: &Shared, f: impl FnOnce(&mut Mounted)) {
    if let Ok(mut m) = shared.try_borrow_mut() {
        f(&mut m);
    }
}

/// How the mount learns about size changes.
#[derive(Debug)]
enum ResizeSource {
    Observer(ResizeWatcher),
    WindowEvent(EventListener),
}

/// A starfield running on one canvas.
#[derive(Debug)]
pub struct Starfield {
    raf: RafLoop,
    listeners: Vec<EventListener>,
    resize: Option<ResizeSource>,
    intersection: Option<IntersectionWatcher>,
    shared: Shared,
}

impl core::fmt::Debug for Mounted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mounted")
            .field("surface", &self.surface)
            .field("particles", &self.field.store().len())
            .finish_non_exhaustive()
    }
}

impl Starfield {
    /// Starts a starfield on `canvas`.
    ///
    /// Fails only if there is no window or document, or the canvas has no 2D
    /// context. Missing optional APIs (observers, `matchMedia`, network
    /// information) just disable the corresponding behaviour.
    pub fn mount(canvas: HtmlCanvasElement, config: &FieldConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let signals = probe::probe_environment(&window);
        let mut surface = CanvasSurface::new(canvas.clone(), config.aria_hidden)?;
        let size = surface.css_size();
        let id = SurfaceId(NEXT_SURFACE.fetch_add(1, Ordering::Relaxed));
        let field = ParticleField::new(id, config, signals, size, seed(), &mut Tracer::none());
        surface.resize(size, field.effective_dpr());

        let shared: Shared = Rc::new(RefCell::new(Mounted { field, surface }));

        let frame_state = Rc::clone(&shared);
        let raf = RafLoop::new(
            move |tick| {
                with_mounted(&frame_state, |m| {
                    m.field
                        .on_frame(&tick, &mut m.surface, &mut Tracer::none());
                });
            },
            id,
        );

        let listeners = attach_listeners(&window, &document, &shared);
        let resize = watch_resize(&window, &canvas, &shared);
        let intersection = watch_intersection(&canvas, &shared, config);

        raf.start();
        Ok(Self {
            raf,
            listeners,
            resize,
            intersection,
            shared,
        })
    }

    /// Stops the loop and detaches everything.
    pub fn unmount(self) {
        drop(self);
    }

    /// Returns `true` while the frame loop is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.raf.is_running()
    }

    /// Current loop state, if not borrowed by a running callback.
    #[must_use]
    pub fn state(&self) -> Option<LoopState> {
        self.shared.try_borrow().ok().map(|m| m.field.state())
    }

    /// Current particle count.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.shared
            .try_borrow()
            .map_or(0, |m| m.field.store().len())
    }

    /// Current quality policy.
    #[must_use]
    pub fn policy(&self) -> Option<QualityPolicy> {
        self.shared.try_borrow().ok().map(|m| *m.field.policy())
    }

    /// Whether an intersection observer is pausing offscreen frames.
    #[must_use]
    pub fn watches_visibility(&self) -> bool {
        self.intersection.is_some()
    }
}

impl Drop for Starfield {
    fn drop(&mut self) {
        self.raf.stop();
        drop(self.intersection.take());
        drop(self.resize.take());
        self.listeners.clear();
    }
}

/// A fresh seed per mount so neighbouring canvases differ.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Math.random() * 2^53 fits in u64"
)]
fn seed() -> u64 {
    (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64
}

fn attach_listeners(window: &Window, document: &Document, shared: &Shared) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    let state = Rc::clone(shared);
    let doc = document.clone();
    if let Ok(l) = EventListener::new(document, "visibilitychange", move |_| {
        let hidden = doc.hidden();
        with_mounted(&state, |m| m.field.set_tab_hidden(hidden));
    }) {
        listeners.push(l);
    }

    if let Some(query) = probe::reduced_motion_query(window) {
        let state = Rc::clone(shared);
        let q = query.clone();
        if let Ok(l) = EventListener::new(&query, "change", move |_| {
            let reduced = q.matches();
            with_mounted(&state, |m| {
                m.field.set_reduced_motion(reduced, &mut Tracer::none());
                m.surface.resize(m.field.size(), m.field.effective_dpr());
            });
        }) {
            listeners.push(l);
        }
    }

    let navigator = window.navigator();
    if let Some(connection) = probe::connection(&navigator) {
        let state = Rc::clone(shared);
        if let Ok(l) = EventListener::new(&connection, "change", move |_| {
            let save_data = probe::save_data(&navigator);
            with_mounted(&state, |m| {
                m.field.set_save_data(save_data, &mut Tracer::none());
                m.surface.resize(m.field.size(), m.field.effective_dpr());
            });
        }) {
            listeners.push(l);
        }
    }

    listeners
}

fn watch_resize(window: &Window, canvas: &HtmlCanvasElement, shared: &Shared) -> Option<ResizeSource> {
    if probe::has_global(window, "ResizeObserver") {
        let state = Rc::clone(shared);
        if let Ok(w) = ResizeWatcher::new(canvas, move || with_mounted(&state, Mounted::resize)) {
            return Some(ResizeSource::Observer(w));
        }
    }
    let state = Rc::clone(shared);
    EventListener::new(window, "resize", move |_| {
        with_mounted(&state, Mounted::resize);
    })
    .ok()
    .map(ResizeSource::WindowEvent)
}

fn watch_intersection(
    canvas: &HtmlCanvasElement,
    shared: &Shared,
    config: &FieldConfig,
) -> Option<IntersectionWatcher> {
    let available = shared
        .try_borrow()
        .is_ok_and(|m| m.field.signals().intersection_observer);
    if !(available && config.pause_when_hidden) {
        return None;
    }
    let state = Rc::clone(shared);
    IntersectionWatcher::new(canvas, move |intersecting| {
        with_mounted(&state, |m| m.field.set_intersecting(intersecting));
    })
    .ok()
}
