// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render loop state machine.
//!
//! [`ParticleField`] owns everything one mounted starfield needs between
//! frames: the normalized config, the probed [`EnvironmentSignals`], the
//! resolved [`QualityPolicy`], the particle store, the sprite cache and the
//! draw throttle. The host calls [`ParticleField::on_frame`] from its frame
//! primitive and reschedules unconditionally; the field decides whether the
//! tick is a paused no-op, a throttled no-op or a real draw.

use kurbo::{Rect, Size};

use crate::config::FieldConfig;
use crate::output::SurfaceId;
use crate::particle::{ParticleStore, SpawnParams};
use crate::policy::{EnvironmentSignals, QualityPolicy};
use crate::sprite::SpriteCache;
use crate::surface::Surface;
use crate::timing::{FramePacer, FrameTick, PaceDecision};
use crate::trace::{
    FrameEvent, LoopStateEvent, PolicyEvent, ResizeEvent, SpriteEvent, Tracer,
};

/// Where the loop is between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Mounted, first tick not yet delivered.
    Scheduled,
    /// Ticks update and draw (subject to the throttle).
    Running,
    /// Ticks are skipped until the gate opens again.
    Paused,
}

/// Visibility inputs that can pause the loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Gate {
    /// The document is hidden (background tab, minimized window).
    pub tab_hidden: bool,
    /// The surface is outside the viewport.
    pub offscreen: bool,
}

impl Gate {
    /// Returns whether ticks should be skipped.
    ///
    /// A hidden tab pauses when either pause option is set. Being offscreen
    /// pauses only with `pause_when_hidden` and a working intersection
    /// observer; without one the surface is never known to be offscreen.
    #[must_use]
    pub fn should_pause(&self, config: &FieldConfig, observer_available: bool) -> bool {
        let tab = self.tab_hidden && (config.pause_on_tab_hidden || config.pause_when_hidden);
        let offscreen = self.offscreen && config.pause_when_hidden && observer_available;
        tab || offscreen
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// The gate is closed; nothing changed.
    Paused,
    /// The frame-rate cap has not elapsed; nothing changed.
    Throttled,
    /// Particles advanced by `dt_ms` and were drawn.
    Drawn {
        /// Simulated milliseconds covered by this frame.
        dt_ms: f64,
        /// Particles drawn.
        particles: usize,
    },
}

/// One mounted starfield.
///
/// `Sp` is the sprite type of the [`Surface`] it draws into.
#[derive(Debug)]
pub struct ParticleField<Sp> {
    id: SurfaceId,
    config: FieldConfig,
    signals: EnvironmentSignals,
    policy: QualityPolicy,
    size: Size,
    store: ParticleStore,
    cache: SpriteCache<Sp>,
    pacer: FramePacer,
    gate: Gate,
    state: LoopState,
}

impl<Sp> ParticleField<Sp> {
    /// Resolves the policy and populates the store for a surface of `size`
    /// CSS pixels.
    ///
    /// Sprites are rasterized at the device pixel ratio in effect now; later
    /// ratio changes only affect the backing store.
    #[must_use]
    pub fn new(
        id: SurfaceId,
        config: &FieldConfig,
        signals: EnvironmentSignals,
        size: Size,
        seed: u64,
        tracer: &mut Tracer<'_>,
    ) -> Self {
        let config = config.normalized();
        let policy = QualityPolicy::resolve(&config, &signals);
        let target = policy.target_count(&config, size);
        let mut store = ParticleStore::new(seed, SpawnParams::new(&config, &policy));
        store.initialize(size, target);
        let cache = SpriteCache::new(config.radius, policy.effective_dpr(&signals));
        tracer.policy(&PolicyEvent::new(id, config.quality, &policy, store.len()));
        Self {
            id,
            pacer: FramePacer::new(policy.fps_cap),
            gate: Gate {
                tab_hidden: signals.document_hidden,
                offscreen: false,
            },
            config,
            signals,
            policy,
            size,
            store,
            cache,
            state: LoopState::Scheduled,
        }
    }

    /// Handles one tick from the host's frame primitive.
    pub fn on_frame<S>(
        &mut self,
        tick: &FrameTick,
        surface: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> FrameOutcome
    where
        S: Surface<Sprite = Sp> + ?Sized,
    {
        let paused = self
            .gate
            .should_pause(&self.config, self.signals.intersection_observer);
        let outcome = if paused {
            self.transition(LoopState::Paused, tick, tracer);
            self.pacer.reset();
            FrameOutcome::Paused
        } else {
            self.transition(LoopState::Running, tick, tracer);
            match self.pacer.poll(tick.now) {
                PaceDecision::Throttled => FrameOutcome::Throttled,
                PaceDecision::Draw { dt_ms } => {
                    let twinkle = self.policy.twinkle_rate(&self.config);
                    self.store.step(dt_ms, twinkle, self.config.wrap_margin);
                    self.draw(surface, tracer);
                    FrameOutcome::Drawn {
                        dt_ms,
                        particles: self.store.len(),
                    }
                }
            }
        };
        tracer.frame(&FrameEvent::new(tick, outcome));
        outcome
    }

    /// Adopts a new surface size: re-resolves the policy and grows or shrinks
    /// the store to the new target count.
    ///
    /// The first non-empty size after an empty one respawns the whole store.
    pub fn resize(&mut self, size: Size, tracer: &mut Tracer<'_>) {
        let previous_count = self.store.len();
        let laid_out = self.size.is_zero_area() && !size.is_zero_area();
        self.size = size;
        if laid_out {
            // Everything spawned before layout sits at the origin.
            self.store.initialize(size, 0);
        } else {
            self.store.set_bounds(size);
        }
        self.apply_policy(tracer);
        tracer.resize(&ResizeEvent {
            surface: self.id,
            size,
            previous_count,
            count: self.store.len(),
        });
    }

    /// Records a change of the reduced-motion preference.
    pub fn set_reduced_motion(&mut self, reduced: bool, tracer: &mut Tracer<'_>) {
        if self.signals.prefers_reduced_motion != reduced {
            self.signals.prefers_reduced_motion = reduced;
            self.apply_policy(tracer);
        }
    }

    /// Records a change of the data-saver hint.
    pub fn set_save_data(&mut self, save_data: Option<bool>, tracer: &mut Tracer<'_>) {
        if self.signals.save_data != save_data {
            self.signals.save_data = save_data;
            self.apply_policy(tracer);
        }
    }

    /// Records document visibility.
    pub fn set_tab_hidden(&mut self, hidden: bool) {
        self.gate.tab_hidden = hidden;
    }

    /// Records whether the surface intersects the viewport.
    pub fn set_intersecting(&mut self, intersecting: bool) {
        self.gate.offscreen = !intersecting;
    }

    /// Identifier used in trace events.
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// The normalized config.
    #[must_use]
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Current environment signals.
    #[must_use]
    pub fn signals(&self) -> &EnvironmentSignals {
        &self.signals
    }

    /// Current quality policy.
    #[must_use]
    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    /// Device pixel ratio the backing store should use.
    #[must_use]
    pub fn effective_dpr(&self) -> f64 {
        self.policy.effective_dpr(&self.signals)
    }

    /// Surface size in CSS pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// The particle store.
    #[must_use]
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Number of cached sprites.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.cache.len()
    }

    /// Current visibility gate.
    #[must_use]
    pub fn gate(&self) -> Gate {
        self.gate
    }

    /// Current loop state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    fn apply_policy(&mut self, tracer: &mut Tracer<'_>) {
        let policy = QualityPolicy::resolve(&self.config, &self.signals);
        if policy.sprite_buckets != self.policy.sprite_buckets {
            self.cache.clear();
        }
        self.pacer.set_fps(policy.fps_cap);
        self.store
            .set_spawn_params(SpawnParams::new(&self.config, &policy));
        self.store.resize(policy.target_count(&self.config, self.size));
        self.policy = policy;
        tracer.policy(&PolicyEvent::new(
            self.id,
            self.config.quality,
            &self.policy,
            self.store.len(),
        ));
    }

    fn transition(&mut self, to: LoopState, tick: &FrameTick, tracer: &mut Tracer<'_>) {
        if self.state == to {
            return;
        }
        tracer.loop_state(&LoopStateEvent {
            frame_index: tick.frame_index,
            surface: self.id,
            now: tick.now,
            from: self.state,
            to,
        });
        self.state = to;
    }

    fn draw<S>(&mut self, surface: &mut S, tracer: &mut Tracer<'_>)
    where
        S: Surface<Sprite = Sp> + ?Sized,
    {
        surface.clear();
        let buckets = self.policy.sprite_buckets;
        let opacity = self.config.opacity;
        for p in self.store.particles() {
            let (key, cached, built) = self.cache.get(p.color, p.radius, buckets, &mut *surface);
            let side = cached.side;
            let span = 2.0 * cached.extent;
            let dest = Rect::from_center_size(p.position, Size::new(span, span));
            surface.draw_sprite(&cached.sprite, dest, p.alpha * opacity);
            if built {
                tracer.sprite(&SpriteEvent {
                    surface: self.id,
                    key,
                    side,
                    cache_len: self.cache.len(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::policy::{MIN_PARTICLES, QualityTier};
    use crate::raster::{GlowBitmap, PixelSurface};
    use crate::time::HostTime;

    const FRAME_US: u64 = 16_667;

    fn signals() -> EnvironmentSignals {
        EnvironmentSignals {
            device_memory_gb: Some(16.0),
            hardware_concurrency: Some(12),
            intersection_observer: true,
            ..EnvironmentSignals::default()
        }
    }

    fn tick(i: u64) -> FrameTick {
        FrameTick {
            now: HostTime(i * FRAME_US),
            frame_index: i,
            surface: SurfaceId(0),
        }
    }

    fn field(config: &FieldConfig, size: Size) -> (ParticleField<GlowBitmap>, PixelSurface) {
        let f = ParticleField::new(
            SurfaceId(0),
            config,
            signals(),
            size,
            11,
            &mut Tracer::none(),
        );
        (f, PixelSurface::new(size, 1.0))
    }

    fn positions(f: &ParticleField<GlowBitmap>) -> Vec<kurbo::Point> {
        f.store().particles().iter().map(|p| p.position).collect()
    }

    #[test]
    fn draws_every_particle_once_per_frame() {
        let size = Size::new(640.0, 360.0);
        let (mut f, mut surface) = field(&FieldConfig::default(), size);
        assert_eq!(f.state(), LoopState::Scheduled);
        let outcome = f.on_frame(&tick(0), &mut surface, &mut Tracer::none());
        assert_eq!(
            outcome,
            FrameOutcome::Drawn {
                dt_ms: 0.0,
                particles: 50
            }
        );
        assert_eq!(f.state(), LoopState::Running);
        assert_eq!(surface.draw_calls(), 50);
        assert!(surface.total_alpha() > 0.0, "something visible");
        assert!(
            f.sprite_count() <= FieldConfig::default().palette.len() * 10,
            "sprite cache bounded"
        );
    }

    #[test]
    fn hidden_tab_freezes_and_resumes_without_jump() {
        let (mut f, mut surface) = field(&FieldConfig::default(), Size::new(800.0, 600.0));
        let mut tracer = Tracer::none();
        for i in 0..3 {
            f.on_frame(&tick(i), &mut surface, &mut tracer);
        }

        f.set_tab_hidden(true);
        let held = positions(&f);
        for i in 3..200 {
            let outcome = f.on_frame(&tick(i), &mut surface, &mut tracer);
            assert_eq!(outcome, FrameOutcome::Paused);
            assert_eq!(positions(&f), held, "no movement while hidden (frame {i})");
        }
        assert_eq!(f.state(), LoopState::Paused);

        f.set_tab_hidden(false);
        let outcome = f.on_frame(&tick(200), &mut surface, &mut tracer);
        assert!(
            matches!(outcome, FrameOutcome::Drawn { dt_ms, .. } if dt_ms == 0.0),
            "first frame after resume covers no time: {outcome:?}"
        );
        assert_eq!(positions(&f), held, "resumed from held positions");

        f.on_frame(&tick(201), &mut surface, &mut tracer);
        assert_ne!(positions(&f), held, "motion continues");
    }

    #[test]
    fn hidden_tab_ignored_when_both_pause_options_are_off() {
        let config = FieldConfig {
            pause_when_hidden: false,
            pause_on_tab_hidden: false,
            ..FieldConfig::default()
        };
        let (mut f, mut surface) = field(&config, Size::new(320.0, 240.0));
        f.set_tab_hidden(true);
        let outcome = f.on_frame(&tick(0), &mut surface, &mut Tracer::none());
        assert!(matches!(outcome, FrameOutcome::Drawn { .. }), "{outcome:?}");
    }

    #[test]
    fn offscreen_pause_needs_an_observer() {
        let config = FieldConfig::default();
        let gate = Gate {
            tab_hidden: false,
            offscreen: true,
        };
        assert!(gate.should_pause(&config, true), "observer available");
        assert!(!gate.should_pause(&config, false), "no observer, no pause");
        let opted_out = FieldConfig {
            pause_when_hidden: false,
            ..FieldConfig::default()
        };
        assert!(!gate.should_pause(&opted_out, true), "option off");

        let (mut f, mut surface) = field(&config, Size::new(320.0, 240.0));
        f.set_intersecting(false);
        let outcome = f.on_frame(&tick(0), &mut surface, &mut Tracer::none());
        assert_eq!(outcome, FrameOutcome::Paused);
    }

    #[test]
    fn throttles_to_the_tier_cap() {
        let config = FieldConfig {
            quality: crate::config::QualityPreset::Battery,
            ..FieldConfig::default()
        };
        let (mut f, mut surface) = field(&config, Size::new(320.0, 240.0));
        assert_eq!(f.policy().fps_cap, 24);
        let mut tracer = Tracer::none();
        let drawn = (0..60)
            .map(|i| f.on_frame(&tick(i), &mut surface, &mut tracer))
            .filter(|o| matches!(o, FrameOutcome::Drawn { .. }))
            .count();
        assert_eq!(drawn, 20, "every third 60 Hz tick draws at 24 fps");
    }

    #[test]
    fn resize_tracks_target_count() {
        let (mut f, _) = field(&FieldConfig::default(), Size::new(1280.0, 720.0));
        assert_eq!(f.store().len(), 100);
        f.resize(Size::new(640.0, 360.0), &mut Tracer::none());
        assert_eq!(f.store().len(), 50);
        f.resize(Size::new(1.0, 1.0), &mut Tracer::none());
        assert_eq!(f.store().len(), MIN_PARTICLES);
        assert_eq!(f.store().bounds(), Size::new(1.0, 1.0));
    }

    #[test]
    fn data_saver_change_re_resolves_policy() {
        let (mut f, mut surface) = field(&FieldConfig::default(), Size::new(1280.0, 720.0));
        f.on_frame(&tick(0), &mut surface, &mut Tracer::none());
        assert!(f.sprite_count() > 0, "sprites built");

        f.set_save_data(Some(true), &mut Tracer::none());
        assert_eq!(f.policy().tier, QualityTier::Battery);
        assert_eq!(f.store().len(), 60);
        assert_eq!(f.sprite_count(), 0, "bucket layout changed");
        assert_eq!(f.policy().twinkle_rate(f.config()), None);

        f.set_reduced_motion(true, &mut Tracer::none());
        assert_eq!(f.store().len(), 36);
    }

    #[test]
    fn reduced_motion_slows_survivors() {
        let (mut f, _) = field(&FieldConfig::default(), Size::new(1280.0, 720.0));
        let before = f.store().particles().to_vec();
        let from = f.policy().velocity_multiplier;

        f.set_reduced_motion(true, &mut Tracer::none());
        let ratio = f.policy().velocity_multiplier / from;
        assert!((ratio - 0.6).abs() < 1e-12, "reduced motion scales by 0.6");
        assert_eq!(f.store().len(), 60);
        for (p, old) in f.store().particles().iter().zip(&before) {
            assert!(
                (p.velocity - old.velocity * ratio).hypot() < 1e-12,
                "{:?} not scaled from {:?}",
                p.velocity,
                old.velocity
            );
        }
    }

    #[test]
    fn first_layout_respawns_across_the_surface() {
        let (mut f, _) = field(&FieldConfig::default(), Size::ZERO);
        assert_eq!(f.store().len(), MIN_PARTICLES);
        assert!(
            f.store()
                .particles()
                .iter()
                .all(|p| p.position == kurbo::Point::ZERO),
            "nothing to spread over yet"
        );

        let size = Size::new(640.0, 360.0);
        f.resize(size, &mut Tracer::none());
        assert_eq!(f.store().len(), 50);
        let at_origin = f
            .store()
            .particles()
            .iter()
            .filter(|p| p.position == kurbo::Point::ZERO)
            .count();
        assert_eq!(at_origin, 0, "respawned inside the laid-out surface");
        assert!(
            f.store()
                .particles()
                .iter()
                .any(|p| p.position.x > size.width / 2.0),
            "spread beyond the origin corner"
        );
    }
}
