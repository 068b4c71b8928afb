// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radius bucketing and the glow sprite cache.
//!
//! Drawing a radial gradient per particle per frame is expensive, so each
//! particle is drawn with a pre-rendered glow sprite instead. Radii are
//! quantized into a small number of evenly spaced buckets; together with the
//! palette this bounds the cache to `palette.len() * bucket_count` entries no
//! matter how many particles there are.
//!
//! Sprites are built on first use through a [`SpriteFactory`] and kept for
//! the lifetime of the cache.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;

use crate::config::{Interval, Rgba8};
use crate::surface::SpriteFactory;

/// Glow extent as a multiple of the particle radius.
pub const GLOW_EXTENT: f64 = 2.0;

/// Radial gradient stops as `(distance fraction, alpha)` pairs.
pub const GLOW_STOPS: [(f64, f64); 3] = [(0.0, 1.0), (0.35, 0.6), (1.0, 0.0)];

/// Quantizes `radius` into one of `bucket_count` evenly spaced radii
/// spanning `range`.
///
/// Returns the bucket index and the bucket's representative radius.
#[must_use]
pub fn bucket_for(radius: f64, range: Interval, bucket_count: u8) -> (u8, f64) {
    let span = range.span();
    if bucket_count <= 1 || span <= 0.0 || !radius.is_finite() {
        return (0, range.min);
    }
    let last = f64::from(bucket_count - 1);
    let t = ((radius - range.min) / span).clamp(0.0, 1.0);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "t * last is in 0..=last, and last < 256"
    )]
    let bucket = libm::round(t * last) as u8;
    (bucket, range.lerp(f64::from(bucket) / last))
}

/// Identifies one cached sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpriteKey {
    /// Palette colour.
    pub color: Rgba8,
    /// Radius bucket index.
    pub bucket: u8,
    /// Number of buckets the index refers to.
    pub bucket_count: u8,
}

/// Everything a factory needs to paint one glow sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowSpec {
    /// Glow colour.
    pub color: Rgba8,
    /// Bucket radius in CSS pixels.
    pub radius: f64,
    /// Distance from centre to the fully transparent edge, in CSS pixels.
    pub extent: f64,
    /// Device pixels per CSS pixel.
    pub scale: f64,
    /// Width and height of the square bitmap in device pixels.
    pub side: u32,
}

impl GlowSpec {
    /// Describes the sprite for a bucket radius at the given raster scale.
    #[must_use]
    pub fn new(color: Rgba8, radius: f64, scale: f64) -> Self {
        let extent = radius * GLOW_EXTENT;
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "sprite sides are a few dozen pixels"
        )]
        let side = (libm::ceil(2.0 * extent * scale).max(2.0)) as u32;
        Self {
            color,
            radius,
            extent,
            scale,
            side,
        }
    }

    /// Gradient alpha at `fraction` of the extent from the centre.
    ///
    /// Piecewise linear between [`GLOW_STOPS`]; zero beyond the edge.
    #[must_use]
    pub fn alpha_at(fraction: f64) -> f64 {
        if fraction.is_nan() || fraction <= 0.0 {
            return GLOW_STOPS[0].1;
        }
        for pair in GLOW_STOPS.windows(2) {
            let (t0, a0) = pair[0];
            let (t1, a1) = pair[1];
            if fraction <= t1 {
                let u = (fraction - t0) / (t1 - t0);
                return a0 + (a1 - a0) * u;
            }
        }
        0.0
    }
}

/// A built sprite with the geometry it was built for.
#[derive(Clone, Debug)]
pub struct CachedSprite<S> {
    /// The backend's sprite handle.
    pub sprite: S,
    /// Glow extent in CSS pixels; the sprite is drawn `2 * extent` wide.
    pub extent: f64,
    /// Bitmap side in device pixels.
    pub side: u32,
}

/// Append-only map from [`SpriteKey`] to built sprites.
#[derive(Debug)]
pub struct SpriteCache<S> {
    entries: BTreeMap<SpriteKey, CachedSprite<S>>,
    radius_range: Interval,
    scale: f64,
}

impl<S> SpriteCache<S> {
    /// Creates an empty cache for radii in `radius_range`, rasterized at
    /// `scale` device pixels per CSS pixel.
    #[must_use]
    pub fn new(radius_range: Interval, scale: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            radius_range,
            scale,
        }
    }

    /// Returns the sprite for a particle, building it on a miss.
    ///
    /// The flag is `true` when this call built the sprite.
    pub fn get<F>(
        &mut self,
        color: Rgba8,
        radius: f64,
        bucket_count: u8,
        factory: &mut F,
    ) -> (SpriteKey, &CachedSprite<S>, bool)
    where
        F: SpriteFactory<Sprite = S> + ?Sized,
    {
        let (bucket, bucket_radius) = bucket_for(radius, self.radius_range, bucket_count);
        let key = SpriteKey {
            color,
            bucket,
            bucket_count,
        };
        match self.entries.entry(key) {
            Entry::Occupied(e) => (key, e.into_mut(), false),
            Entry::Vacant(e) => {
                let spec = GlowSpec::new(color, bucket_radius, self.scale);
                let sprite = factory.build_sprite(&spec);
                let cached = e.insert(CachedSprite {
                    sprite,
                    extent: spec.extent,
                    side: spec.side,
                });
                (key, cached, true)
            }
        }
    }

    /// Number of cached sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raster scale sprites are built at.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Drops every sprite. Used when the bucket layout changes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingFactory {
        built: usize,
    }

    impl SpriteFactory for CountingFactory {
        type Sprite = GlowSpec;

        fn build_sprite(&mut self, spec: &GlowSpec) -> GlowSpec {
            self.built += 1;
            *spec
        }
    }

    #[test]
    fn buckets_span_the_range() {
        let range = Interval::new(0.6, 1.8);
        assert_eq!(bucket_for(0.6, range, 4), (0, 0.6));
        assert_eq!(bucket_for(1.8, range, 4).0, 3);
        assert!((bucket_for(1.8, range, 4).1 - 1.8).abs() < 1e-12);
        assert_eq!(bucket_for(-5.0, range, 4).0, 0, "clamped below");
        assert_eq!(bucket_for(99.0, range, 10).0, 9, "clamped above");
        assert_eq!(bucket_for(1.0, Interval::new(1.0, 1.0), 10), (0, 1.0));
    }

    #[test]
    fn glow_geometry() {
        let spec = GlowSpec::new(Rgba8::WHITE, 1.5, 2.0);
        assert_eq!(spec.extent, 3.0);
        assert_eq!(spec.side, 12);
        let tiny = GlowSpec::new(Rgba8::WHITE, 0.1, 1.0);
        assert_eq!(tiny.side, 2, "minimum side");
    }

    #[test]
    fn gradient_stops() {
        assert_eq!(GlowSpec::alpha_at(0.0), 1.0);
        assert!((GlowSpec::alpha_at(0.35) - 0.6).abs() < 1e-12);
        assert!((GlowSpec::alpha_at(0.675) - 0.3).abs() < 1e-12);
        assert_eq!(GlowSpec::alpha_at(1.0), 0.0);
        assert_eq!(GlowSpec::alpha_at(1.5), 0.0);
    }

    #[test]
    fn cache_size_is_bounded_by_palette_and_buckets() {
        let palette = [
            Rgba8::WHITE,
            Rgba8::rgb(0xc7, 0xd2, 0xfe),
            Rgba8::rgb(0x93, 0xc5, 0xfd),
        ];
        let range = Interval::new(0.6, 1.8);
        let mut cache = SpriteCache::new(range, 1.0);
        let mut factory = CountingFactory::default();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..5000 {
            let color = palette[rng.usize(..palette.len())];
            cache.get(color, range.lerp(rng.f64()), 6, &mut factory);
        }
        assert!(cache.len() <= palette.len() * 6, "{} entries", cache.len());
        assert_eq!(factory.built, cache.len(), "one build per miss");
    }

    #[test]
    fn hit_returns_same_sprite() {
        let mut cache = SpriteCache::new(Interval::new(0.6, 1.8), 1.0);
        let mut factory = CountingFactory::default();
        let (k1, _, built) = cache.get(Rgba8::WHITE, 1.0, 10, &mut factory);
        assert!(built, "first lookup builds");
        let (k2, _, built) = cache.get(Rgba8::WHITE, 1.0, 10, &mut factory);
        assert!(!built, "second lookup hits");
        assert_eq!(k1, k2);
        assert_eq!(factory.built, 1);
    }
}
