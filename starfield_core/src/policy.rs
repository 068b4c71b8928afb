// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Environment signals and the quality policy derived from them.
//!
//! Backends probe the host once per mount and hand the result over as an
//! [`EnvironmentSignals`] value; the render loop never queries the host
//! itself. [`QualityPolicy::resolve`] turns the signals plus the caller's
//! [`FieldConfig`] into everything that scales rendering work:
//!
//! | Tier       | Buckets | FPS cap          | Auto DPR | Count | Twinkle | Velocity |
//! |------------|---------|------------------|----------|-------|---------|----------|
//! | `High`     | 10      | `max_fps`        | 2.0      | 1.0   | 1.0     | 1.0      |
//! | `Balanced` | 6       | `min(max_fps,30)`| 1.5      | 0.8   | 0.8     | 1.0      |
//! | `Battery`  | 4       | `min(max_fps,24)`| 1.0      | 0.6   | 0.6     | 0.85     |
//!
//! Reduced motion additionally scales count and velocity by 0.6.

use kurbo::Size;

use crate::config::{DprCap, FieldConfig, QualityPreset};

/// Devices with at most this much memory (GB) are considered low-end.
pub const LOW_END_MEMORY_GB: f64 = 4.0;

/// Devices with at most this many logical cores are considered low-end.
pub const LOW_END_CORES: u32 = 4;

/// Count/velocity scale applied when reduced motion is preferred.
pub const REDUCED_MOTION_SCALE: f64 = 0.6;

/// Surface area at which the area scale factor is exactly 1.
pub const BASE_AREA: Size = Size::new(1280.0, 720.0);

/// Fewest particles a store ever holds.
pub const MIN_PARTICLES: usize = 16;

/// Most particles the policy will ever ask for.
pub const MAX_PARTICLES: usize = 1500;

/// Ambient host state, captured once by a capability probe.
///
/// `None` means the host does not expose that signal; absent signals never
/// trigger a downgrade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentSignals {
    /// The user asked for reduced motion.
    pub prefers_reduced_motion: bool,
    /// Network data-saver hint, if exposed.
    pub save_data: Option<bool>,
    /// Approximate device memory in gigabytes, if exposed.
    pub device_memory_gb: Option<f64>,
    /// Logical CPU count, if exposed.
    pub hardware_concurrency: Option<u32>,
    /// Ratio of device pixels to CSS pixels.
    pub device_pixel_ratio: f64,
    /// The document was hidden when probed.
    pub document_hidden: bool,
    /// An intersection observer is available for offscreen pausing.
    pub intersection_observer: bool,
}

impl Default for EnvironmentSignals {
    fn default() -> Self {
        Self {
            prefers_reduced_motion: false,
            save_data: None,
            device_memory_gb: None,
            hardware_concurrency: None,
            device_pixel_ratio: 1.0,
            document_hidden: false,
            intersection_observer: false,
        }
    }
}

impl EnvironmentSignals {
    /// Returns `true` when memory or core count marks a low-end device.
    #[must_use]
    pub fn is_low_end(&self) -> bool {
        self.device_memory_gb
            .is_some_and(|gb| gb <= LOW_END_MEMORY_GB)
            || self
                .hardware_concurrency
                .is_some_and(|cores| cores <= LOW_END_CORES)
    }
}

/// The quality tier actually used for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityTier {
    /// Full quality.
    High,
    /// Reduced sprite detail and frame rate.
    Balanced,
    /// Minimum rendering work.
    Battery,
}

impl QualityTier {
    /// Number of sprite radius buckets for this tier.
    #[must_use]
    pub const fn sprite_buckets(self) -> u8 {
        match self {
            Self::High => 10,
            Self::Balanced => 6,
            Self::Battery => 4,
        }
    }

    /// Auto-derived device-pixel-ratio cap for this tier.
    #[must_use]
    pub const fn auto_dpr_cap(self) -> f64 {
        match self {
            Self::High => 2.0,
            Self::Balanced => 1.5,
            Self::Battery => 1.0,
        }
    }

    /// Applies this tier's ceiling to the caller's frame-rate cap.
    #[must_use]
    pub fn fps_cap(self, requested: u32) -> u32 {
        let requested = requested.max(1);
        match self {
            Self::High => requested,
            Self::Balanced => requested.min(30),
            Self::Battery => requested.min(24),
        }
    }

    const fn count_multiplier(self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Balanced => 0.8,
            Self::Battery => 0.6,
        }
    }

    const fn twinkle_multiplier(self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Balanced => 0.8,
            Self::Battery => 0.6,
        }
    }

    const fn velocity_multiplier(self) -> f64 {
        match self {
            Self::High | Self::Balanced => 1.0,
            Self::Battery => 0.85,
        }
    }
}

impl From<QualityPreset> for QualityTier {
    fn from(preset: QualityPreset) -> Self {
        match preset {
            QualityPreset::High => Self::High,
            QualityPreset::Balanced => Self::Balanced,
            QualityPreset::Battery => Self::Battery,
        }
    }
}

/// Why the effective tier differs from the requested preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DowngradeReason {
    /// Device memory or core count is at or below the low-end threshold.
    LowEndDevice,
    /// The host reports an active data-saver preference.
    DataSaver,
}

/// Everything that scales rendering work, resolved from config and signals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityPolicy {
    /// Effective tier.
    pub tier: QualityTier,
    /// Set when the tier was forced to [`QualityTier::Battery`].
    pub downgrade: Option<DowngradeReason>,
    /// Effective frame-rate cap.
    pub fps_cap: u32,
    /// Cap applied to the device pixel ratio.
    pub dpr_cap: f64,
    /// Number of sprite radius buckets.
    pub sprite_buckets: u8,
    /// Multiplier on the particle count.
    pub count_multiplier: f64,
    /// Multiplier on spawned velocities.
    pub velocity_multiplier: f64,
    /// Multiplier on the twinkle rate.
    pub twinkle_multiplier: f64,
    /// Whether alpha twinkle runs at all.
    pub twinkle_enabled: bool,
    /// Reduced motion was honoured.
    pub reduced_motion: bool,
    /// A data-saver signal was honoured.
    pub data_saver: bool,
}

impl QualityPolicy {
    /// Resolves the policy for one mount or resize.
    #[must_use]
    pub fn resolve(config: &FieldConfig, signals: &EnvironmentSignals) -> Self {
        let data_saver = config.respect_data_saver && signals.save_data == Some(true);

        let downgrade = if config.adaptive_quality && signals.is_low_end() {
            Some(DowngradeReason::LowEndDevice)
        } else if data_saver {
            Some(DowngradeReason::DataSaver)
        } else {
            None
        };

        let tier = if downgrade.is_some() {
            QualityTier::Battery
        } else {
            QualityTier::from(config.quality)
        };

        let reduced_motion = signals.prefers_reduced_motion;
        let motion_scale = if reduced_motion {
            REDUCED_MOTION_SCALE
        } else {
            1.0
        };

        let dpr_cap = match config.dpr_cap {
            DprCap::Fixed(v) if v.is_finite() && v > 0.0 => v,
            _ => tier.auto_dpr_cap(),
        };

        Self {
            tier,
            downgrade,
            fps_cap: tier.fps_cap(config.max_fps),
            dpr_cap,
            sprite_buckets: tier.sprite_buckets(),
            count_multiplier: tier.count_multiplier() * motion_scale,
            velocity_multiplier: tier.velocity_multiplier() * motion_scale,
            twinkle_multiplier: tier.twinkle_multiplier(),
            twinkle_enabled: config.twinkle && !reduced_motion && !data_saver,
            reduced_motion,
            data_saver,
        }
    }

    /// Returns the device pixel ratio to render at, after the cap.
    #[must_use]
    pub fn effective_dpr(&self, signals: &EnvironmentSignals) -> f64 {
        let dpr = signals.device_pixel_ratio;
        let dpr = if dpr.is_finite() && dpr > 0.0 {
            dpr
        } else {
            1.0
        };
        dpr.min(self.dpr_cap).max(1.0)
    }

    /// Returns the particle count for a surface of the given size.
    ///
    /// With `scale_with_area`, the base count scales by
    /// `sqrt(area / BASE_AREA)`, so it is unchanged at 1280×720 and halved at
    /// 640×360.
    #[must_use]
    pub fn target_count(&self, config: &FieldConfig, size: Size) -> usize {
        let area_scale = if config.scale_with_area {
            let area = size.width.max(0.0) * size.height.max(0.0);
            libm::sqrt(area / BASE_AREA.area())
        } else {
            1.0
        };
        let raw = f64::from(config.count) * area_scale * self.count_multiplier;
        if !raw.is_finite() {
            return MIN_PARTICLES;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is rounded, non-negative and clamped below MAX_PARTICLES"
        )]
        let count = libm::round(raw.clamp(0.0, MAX_PARTICLES as f64)) as usize;
        count.clamp(MIN_PARTICLES, MAX_PARTICLES)
    }

    /// Twinkle rate per 60 Hz step, or `None` when twinkle is off.
    #[must_use]
    pub fn twinkle_rate(&self, config: &FieldConfig) -> Option<f64> {
        self.twinkle_enabled
            .then(|| config.twinkle_rate * self.twinkle_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> EnvironmentSignals {
        EnvironmentSignals {
            device_memory_gb: Some(16.0),
            hardware_concurrency: Some(12),
            ..EnvironmentSignals::default()
        }
    }

    #[test]
    fn low_memory_forces_battery() {
        let sig = EnvironmentSignals {
            device_memory_gb: Some(2.0),
            ..signals()
        };
        for preset in [
            QualityPreset::High,
            QualityPreset::Balanced,
            QualityPreset::Battery,
        ] {
            let cfg = FieldConfig {
                quality: preset,
                adaptive_quality: true,
                ..FieldConfig::default()
            };
            let policy = QualityPolicy::resolve(&cfg, &sig);
            assert_eq!(policy.tier, QualityTier::Battery, "preset {preset:?}");
            assert!(policy.fps_cap <= 24, "battery caps fps at 24");
            assert_eq!(policy.downgrade, Some(DowngradeReason::LowEndDevice));
        }
    }

    #[test]
    fn few_cores_force_battery_only_when_adaptive() {
        let sig = EnvironmentSignals {
            hardware_concurrency: Some(4),
            ..signals()
        };
        let adaptive = QualityPolicy::resolve(&FieldConfig::default(), &sig);
        assert_eq!(adaptive.tier, QualityTier::Battery);

        let fixed = QualityPolicy::resolve(
            &FieldConfig {
                adaptive_quality: false,
                ..FieldConfig::default()
            },
            &sig,
        );
        assert_eq!(fixed.tier, QualityTier::High, "no downgrade when disabled");
    }

    #[test]
    fn data_saver_respects_flag() {
        let sig = EnvironmentSignals {
            save_data: Some(true),
            ..signals()
        };
        let honoured = QualityPolicy::resolve(&FieldConfig::default(), &sig);
        assert_eq!(honoured.tier, QualityTier::Battery);
        assert_eq!(honoured.downgrade, Some(DowngradeReason::DataSaver));
        assert!(!honoured.twinkle_enabled, "data saver disables twinkle");

        let ignored = QualityPolicy::resolve(
            &FieldConfig {
                respect_data_saver: false,
                ..FieldConfig::default()
            },
            &sig,
        );
        assert_eq!(ignored.tier, QualityTier::High);
        assert!(ignored.twinkle_enabled, "twinkle stays on");
    }

    #[test]
    fn tier_fps_caps() {
        let cfg = FieldConfig {
            max_fps: 120,
            ..FieldConfig::default()
        };
        let mut sig = signals();
        let high = QualityPolicy::resolve(&cfg, &sig);
        assert_eq!(high.fps_cap, 120);
        assert_eq!(high.sprite_buckets, 10);

        let balanced = QualityPolicy::resolve(
            &FieldConfig {
                quality: QualityPreset::Balanced,
                ..cfg.clone()
            },
            &sig,
        );
        assert_eq!(balanced.fps_cap, 30);
        assert_eq!(balanced.sprite_buckets, 6);

        sig.device_memory_gb = Some(1.0);
        let battery = QualityPolicy::resolve(&cfg, &sig);
        assert_eq!(battery.fps_cap, 24);
        assert_eq!(battery.sprite_buckets, 4);
    }

    #[test]
    fn reduced_motion_scales_count_and_velocity() {
        let sig = EnvironmentSignals {
            prefers_reduced_motion: true,
            ..signals()
        };
        let policy = QualityPolicy::resolve(&FieldConfig::default(), &sig);
        assert_eq!(policy.tier, QualityTier::High, "tier is unaffected");
        assert!((policy.count_multiplier - 0.6).abs() < 1e-12, "count ×0.6");
        assert!((policy.velocity_multiplier - 0.6).abs() < 1e-12, "velocity ×0.6");
        assert_eq!(policy.twinkle_rate(&FieldConfig::default()), None);
    }

    #[test]
    fn dpr_cap_auto_and_override() {
        let sig = EnvironmentSignals {
            device_pixel_ratio: 3.0,
            ..signals()
        };
        let auto = QualityPolicy::resolve(&FieldConfig::default(), &sig);
        assert_eq!(auto.effective_dpr(&sig), 2.0);

        let fixed = QualityPolicy::resolve(
            &FieldConfig {
                dpr_cap: DprCap::Fixed(2.5),
                ..FieldConfig::default()
            },
            &sig,
        );
        assert_eq!(fixed.effective_dpr(&sig), 2.5);

        let bogus = EnvironmentSignals {
            device_pixel_ratio: f64::NAN,
            ..sig
        };
        assert_eq!(auto.effective_dpr(&bogus), 1.0);
    }

    #[test]
    fn target_count_scales_with_area() {
        let cfg = FieldConfig::default();
        let policy = QualityPolicy::resolve(&cfg, &signals());
        assert_eq!(policy.target_count(&cfg, Size::new(1280.0, 720.0)), 100);
        assert_eq!(policy.target_count(&cfg, Size::new(640.0, 360.0)), 50);
        assert_eq!(
            policy.target_count(&cfg, Size::new(10.0, 10.0)),
            MIN_PARTICLES,
            "floor keeps the effect visible"
        );
        assert_eq!(policy.target_count(&cfg, Size::ZERO), MIN_PARTICLES);

        let huge = FieldConfig {
            count: 1_000_000,
            ..FieldConfig::default()
        };
        assert_eq!(
            policy.target_count(&huge, Size::new(1280.0, 720.0)),
            MAX_PARTICLES
        );

        let flat = FieldConfig {
            scale_with_area: false,
            ..FieldConfig::default()
        };
        assert_eq!(policy.target_count(&flat, Size::new(640.0, 360.0)), 100);
    }
}
