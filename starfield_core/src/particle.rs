// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat particle arena.
//!
//! [`ParticleStore`] holds every particle of one field in a single `Vec`.
//! Particles have no identity beyond their index: growing appends freshly
//! spawned particles and shrinking truncates from the tail, so a resize never
//! disturbs the survivors.
//!
//! Velocities are expressed per normalized step ([`STEP_MS`]); integrating
//! over `dt` milliseconds advances a particle by `velocity * dt / STEP_MS`.

use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};

use crate::config::{FieldConfig, Interval, Rgba8, default_palette};
use crate::policy::{MIN_PARTICLES, QualityPolicy};
use crate::timing::STEP_MS;

/// Lowest alpha a twinkling particle reaches.
pub const ALPHA_MIN: f64 = 0.25;

/// Highest alpha a twinkling particle reaches.
pub const ALPHA_MAX: f64 = 1.0;

/// Range newly spawned particles draw their alpha from.
pub const SPAWN_ALPHA: Interval = Interval::new(0.35, 1.0);

/// Direction of a particle's alpha pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TwinkleDirection {
    /// Alpha is increasing.
    Rising,
    /// Alpha is decreasing.
    Falling,
}

impl TwinkleDirection {
    /// Returns `1.0` or `-1.0`.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Rising => 1.0,
            Self::Falling => -1.0,
        }
    }
}

/// One drifting point of light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Centre in CSS pixels.
    pub position: Point,
    /// Displacement per normalized step.
    pub velocity: Vec2,
    /// Radius in CSS pixels.
    pub radius: f64,
    /// Palette colour.
    pub color: Rgba8,
    /// Current alpha, always within `ALPHA_MIN..=ALPHA_MAX`.
    pub alpha: f64,
    /// Current pulse direction.
    pub twinkle: TwinkleDirection,
}

/// Distributions newly spawned particles are drawn from.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnParams {
    /// Colours, chosen uniformly.
    pub palette: Vec<Rgba8>,
    /// Radius range.
    pub radius: Interval,
    /// Horizontal velocity range before the multiplier.
    pub velocity_x: Interval,
    /// Vertical velocity range before the multiplier.
    pub velocity_y: Interval,
    /// Applied to both velocity components.
    pub velocity_multiplier: f64,
}

impl SpawnParams {
    /// Derives spawn distributions from the config and resolved policy.
    #[must_use]
    pub fn new(config: &FieldConfig, policy: &QualityPolicy) -> Self {
        Self {
            palette: config.palette.clone(),
            radius: config.radius,
            velocity_x: config.velocity_x,
            velocity_y: config.velocity_y,
            velocity_multiplier: policy.velocity_multiplier,
        }
    }
}

impl Default for SpawnParams {
    fn default() -> Self {
        let config = FieldConfig::default();
        Self {
            palette: config.palette,
            radius: config.radius,
            velocity_x: config.velocity_x,
            velocity_y: config.velocity_y,
            velocity_multiplier: 1.0,
        }
    }
}

/// The particle arena of one field.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    bounds: Size,
    params: SpawnParams,
    rng: fastrand::Rng,
}

impl ParticleStore {
    /// Creates an empty store with a deterministic random source.
    #[must_use]
    pub fn new(seed: u64, params: SpawnParams) -> Self {
        Self {
            particles: Vec::new(),
            bounds: Size::ZERO,
            params,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Discards all particles and spawns `max(MIN_PARTICLES, target)` fresh
    /// ones inside `bounds`.
    pub fn initialize(&mut self, bounds: Size, target: usize) {
        self.bounds = bounds;
        self.particles.clear();
        self.resize(target);
    }

    /// Grows or shrinks to exactly `max(MIN_PARTICLES, target)` particles.
    ///
    /// Growth appends particles from the current spawn distributions;
    /// shrinking drops from the tail. Survivors are untouched.
    pub fn resize(&mut self, target: usize) {
        let target = target.max(MIN_PARTICLES);
        let len = self.particles.len();
        if target < len {
            self.particles.truncate(target);
        } else if target > len {
            self.particles.reserve(target - len);
            for _ in len..target {
                let p = self.spawn();
                self.particles.push(p);
            }
        }
    }

    /// Updates the spawn and wrap bounds without touching existing particles.
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    /// Replaces the spawn distributions for particles created afterwards.
    ///
    /// A changed velocity multiplier also rescales every existing particle,
    /// so a switch to reduced motion slows the whole field. Palette and radius
    /// changes only reach new particles. Survivors of a zero multiplier stay
    /// still.
    pub fn set_spawn_params(&mut self, params: SpawnParams) {
        let from = self.params.velocity_multiplier;
        let to = params.velocity_multiplier;
        if from > 0.0 && from != to {
            let ratio = to / from;
            for p in &mut self.particles {
                p.velocity *= ratio;
            }
        }
        self.params = params;
    }

    /// Advances every particle by `dt_ms`.
    ///
    /// Positions wrap once a particle is more than `margin` past an edge.
    /// With `Some(rate)`, alpha moves by `rate` per normalized step, bouncing
    /// between [`ALPHA_MIN`] and [`ALPHA_MAX`].
    pub fn step(&mut self, dt_ms: f64, twinkle: Option<f64>, margin: f64) {
        let steps = dt_ms / STEP_MS;
        let Size { width, height } = self.bounds;
        for p in &mut self.particles {
            p.position += p.velocity * steps;
            p.position.x = wrap(p.position.x, width, margin);
            p.position.y = wrap(p.position.y, height, margin);

            if let Some(rate) = twinkle {
                p.alpha += p.twinkle.sign() * rate * steps;
                if p.alpha >= ALPHA_MAX {
                    p.alpha = ALPHA_MAX;
                    p.twinkle = TwinkleDirection::Falling;
                } else if p.alpha <= ALPHA_MIN {
                    p.alpha = ALPHA_MIN;
                    p.twinkle = TwinkleDirection::Rising;
                }
            }
        }
    }

    /// Particles in draw order.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Returns `true` before the first [`initialize`](Self::initialize).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current spawn and wrap bounds.
    #[must_use]
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Current spawn distributions.
    #[must_use]
    pub fn spawn_params(&self) -> &SpawnParams {
        &self.params
    }

    fn spawn(&mut self) -> Particle {
        let rng = &mut self.rng;
        let params = &self.params;
        let color = if params.palette.is_empty() {
            default_palette()[0]
        } else {
            params.palette[rng.usize(..params.palette.len())]
        };
        let velocity = Vec2::new(
            params.velocity_x.lerp(rng.f64()),
            params.velocity_y.lerp(rng.f64()),
        ) * params.velocity_multiplier;
        Particle {
            position: Point::new(
                rng.f64() * self.bounds.width,
                rng.f64() * self.bounds.height,
            ),
            velocity,
            radius: params.radius.lerp(rng.f64()),
            color,
            alpha: SPAWN_ALPHA.lerp(rng.f64()),
            twinkle: if rng.bool() {
                TwinkleDirection::Rising
            } else {
                TwinkleDirection::Falling
            },
        }
    }
}

fn wrap(v: f64, extent: f64, margin: f64) -> f64 {
    if v > extent + margin {
        -margin
    } else if v < -margin {
        extent + margin
    } else {
        v
    }
}
