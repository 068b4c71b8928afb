// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time configuration.
//!
//! A starfield is configured entirely through one [`FieldConfig`] value when
//! it is mounted; there is no runtime mutation API. String forms of the
//! enumerated options (`"battery"`, `"auto"`, `"#93c5fd"`) parse through
//! [`FromStr`] so host bindings can pass options straight through.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

/// An 8-bit-per-channel colour with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Creates an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Returns the channels as `0.0..=1.0` floats.
    #[must_use]
    pub fn to_f64(self) -> [f64; 4] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
            f64::from(self.a) / 255.0,
        ]
    }
}

impl fmt::Debug for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl FromStr for Rgba8 {
    type Err = ConfigError;

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor);
        }
        let nibble = |i: usize| -> Result<u8, ConfigError> {
            u8::from_str_radix(&hex[i..=i], 16).map_err(|_| ConfigError::InvalidColor)
        };
        let byte = |i: usize| -> Result<u8, ConfigError> {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ConfigError::InvalidColor)
        };
        match hex.len() {
            3 => Ok(Self::rgb(
                nibble(0)? * 0x11,
                nibble(1)? * 0x11,
                nibble(2)? * 0x11,
            )),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(ConfigError::InvalidColor),
        }
    }
}

/// A closed `[min, max]` range of `f64` values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// Creates an interval, swapping the bounds if they are reversed.
    #[must_use]
    pub const fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Returns `max - min`.
    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    /// Maps `t` in `0.0..=1.0` onto the interval.
    #[must_use]
    pub fn lerp(self, t: f64) -> f64 {
        self.min + self.span() * t
    }

    /// Returns whether `v` lies inside the interval (inclusive).
    #[must_use]
    pub fn contains(self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Requested rendering quality.
///
/// The effective tier may be lower; see
/// [`QualityPolicy`](crate::policy::QualityPolicy).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum QualityPreset {
    /// Full particle count, finest sprites, caller's frame-rate cap.
    #[default]
    High,
    /// Moderate sprite detail, at most 30 fps.
    Balanced,
    /// Fewest sprites and particles, at most 24 fps.
    Battery,
}

impl QualityPreset {
    /// Returns the lowercase option name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Battery => "battery",
        }
    }
}

impl FromStr for QualityPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(Self::High),
            "balanced" => Ok(Self::Balanced),
            "battery" => Ok(Self::Battery),
            _ => Err(ConfigError::UnknownQuality),
        }
    }
}

/// Device-pixel-ratio cap for the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum DprCap {
    /// Derive the cap from the effective quality tier.
    #[default]
    Auto,
    /// Use this cap regardless of tier.
    Fixed(f64),
}

impl FromStr for DprCap {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "auto" {
            return Ok(Self::Auto);
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(Self::Fixed(v)),
            _ => Err(ConfigError::InvalidDprCap),
        }
    }
}

/// Errors produced while parsing configuration strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A palette entry was not a `#rgb`, `#rrggbb` or `#rrggbbaa` colour.
    InvalidColor,
    /// The quality preset was not `high`, `balanced` or `battery`.
    UnknownQuality,
    /// The DPR cap was neither `auto` nor a positive number.
    InvalidDprCap,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor => f.write_str("invalid hex colour"),
            Self::UnknownQuality => {
                f.write_str("quality must be one of \"high\", \"balanced\", \"battery\"")
            }
            Self::InvalidDprCap => f.write_str("dpr cap must be \"auto\" or a positive number"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Upper bound for the frame-rate cap.
pub const MAX_FPS_LIMIT: u32 = 240;

/// Smallest particle radius accepted after normalization.
pub const MIN_RADIUS: f64 = 0.1;

/// The palette used when none (or an empty one) is supplied.
#[must_use]
pub fn default_palette() -> Vec<Rgba8> {
    vec![
        Rgba8::WHITE,
        Rgba8::rgb(0xc7, 0xd2, 0xfe),
        Rgba8::rgb(0x93, 0xc5, 0xfd),
        Rgba8::rgb(0xfd, 0xe6, 0x8a),
    ]
}

/// Construction-time options for one starfield instance.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    /// Desired particle count before area and quality scaling.
    pub count: u32,
    /// Colours particles are drawn from, uniformly.
    pub palette: Vec<Rgba8>,
    /// Particle radius range in CSS pixels.
    pub radius: Interval,
    /// Horizontal speed range in pixels per 60 Hz step.
    pub velocity_x: Interval,
    /// Vertical speed range in pixels per 60 Hz step.
    pub velocity_y: Interval,
    /// Multiplier applied to every drawn alpha.
    pub opacity: f64,
    /// Whether particle alpha pulses.
    pub twinkle: bool,
    /// Alpha change per 60 Hz step while twinkling.
    pub twinkle_rate: f64,
    /// Pause while the tab is hidden or the surface is off-screen.
    pub pause_when_hidden: bool,
    /// Pause while the tab is hidden.
    pub pause_on_tab_hidden: bool,
    /// Caller's frame-rate cap; the quality tier may lower it further.
    pub max_fps: u32,
    /// Scale the particle count with the surface area.
    pub scale_with_area: bool,
    /// Requested quality.
    pub quality: QualityPreset,
    /// Allow low-end device signals to force the battery tier.
    pub adaptive_quality: bool,
    /// Allow the data-saver signal to force the battery tier.
    pub respect_data_saver: bool,
    /// Device-pixel-ratio cap.
    pub dpr_cap: DprCap,
    /// Mark the drawing surface as decorative for assistive technology.
    pub aria_hidden: bool,
    /// How far past an edge a particle travels before re-entering opposite.
    pub wrap_margin: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 100,
            palette: default_palette(),
            radius: Interval::new(0.6, 1.8),
            velocity_x: Interval::new(-0.12, 0.12),
            velocity_y: Interval::new(-0.06, 0.06),
            opacity: 0.9,
            twinkle: true,
            twinkle_rate: 0.008,
            pause_when_hidden: true,
            pause_on_tab_hidden: true,
            max_fps: 60,
            scale_with_area: true,
            quality: QualityPreset::High,
            adaptive_quality: true,
            respect_data_saver: true,
            dpr_cap: DprCap::Auto,
            aria_hidden: true,
            wrap_margin: 10.0,
        }
    }
}

impl FieldConfig {
    /// Replaces the palette with parsed colours.
    ///
    /// An empty list keeps the default palette.
    pub fn with_palette_str(mut self, colors: &[&str]) -> Result<Self, ConfigError> {
        let palette = colors
            .iter()
            .map(|c| c.parse::<Rgba8>())
            .collect::<Result<Vec<_>, _>>()?;
        self.palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };
        Ok(self)
    }

    /// Returns a copy with every option clamped into its usable range.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.palette.is_empty() {
            out.palette = default_palette();
        }
        let r_min = finite_or(out.radius.min, MIN_RADIUS).max(MIN_RADIUS);
        let r_max = finite_or(out.radius.max, r_min).max(MIN_RADIUS);
        out.radius = Interval::new(r_min, r_max);
        out.velocity_x = finite_interval(out.velocity_x);
        out.velocity_y = finite_interval(out.velocity_y);
        out.opacity = finite_or(out.opacity, 1.0).clamp(0.0, 1.0);
        out.twinkle_rate = finite_or(out.twinkle_rate, 0.0).max(0.0);
        out.max_fps = out.max_fps.clamp(1, MAX_FPS_LIMIT);
        out.wrap_margin = finite_or(out.wrap_margin, 0.0).max(0.0);
        if let DprCap::Fixed(v) = out.dpr_cap
            && !(v.is_finite() && v > 0.0)
        {
            out.dpr_cap = DprCap::Auto;
        }
        out
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

fn finite_interval(i: Interval) -> Interval {
    Interval::new(finite_or(i.min, 0.0), finite_or(i.max, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#fff".parse(), Ok(Rgba8::WHITE));
        assert_eq!("#93c5fd".parse(), Ok(Rgba8::rgb(0x93, 0xc5, 0xfd)));
        assert_eq!(
            "11223380".parse(),
            Ok(Rgba8 {
                r: 0x11,
                g: 0x22,
                b: 0x33,
                a: 0x80
            })
        );
        assert_eq!("#12".parse::<Rgba8>(), Err(ConfigError::InvalidColor));
        assert_eq!("#zzzzzz".parse::<Rgba8>(), Err(ConfigError::InvalidColor));
        assert_eq!("#ééé".parse::<Rgba8>(), Err(ConfigError::InvalidColor));
    }

    #[test]
    fn parses_enumerated_options() {
        assert_eq!("battery".parse(), Ok(QualityPreset::Battery));
        assert_eq!(
            "ultra".parse::<QualityPreset>(),
            Err(ConfigError::UnknownQuality)
        );
        assert_eq!("auto".parse(), Ok(DprCap::Auto));
        assert_eq!("1.5".parse(), Ok(DprCap::Fixed(1.5)));
        assert_eq!("0".parse::<DprCap>(), Err(ConfigError::InvalidDprCap));
    }

    #[test]
    fn interval_swaps_reversed_bounds() {
        let i = Interval::new(2.0, -1.0);
        assert_eq!(i.min, -1.0);
        assert_eq!(i.max, 2.0);
        assert!(i.contains(0.5), "midpoint is inside");
        assert_eq!(i.lerp(0.5), 0.5);
    }

    #[test]
    fn empty_palette_falls_back_to_default() {
        let cfg = FieldConfig::default().with_palette_str(&[]).unwrap();
        assert_eq!(cfg.palette, default_palette());

        let cfg = FieldConfig::default()
            .with_palette_str(&["#000", "#fff"])
            .unwrap();
        assert_eq!(cfg.palette.len(), 2);

        let err = FieldConfig::default().with_palette_str(&["nope"]);
        assert_eq!(err, Err(ConfigError::InvalidColor));
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let cfg = FieldConfig {
            opacity: 3.0,
            max_fps: 0,
            radius: Interval::new(-1.0, f64::NAN),
            dpr_cap: DprCap::Fixed(-2.0),
            palette: Vec::new(),
            ..FieldConfig::default()
        }
        .normalized();
        assert_eq!(cfg.opacity, 1.0);
        assert_eq!(cfg.max_fps, 1);
        assert!(cfg.radius.min >= MIN_RADIUS, "radius floor applied");
        assert_eq!(cfg.dpr_cap, DprCap::Auto);
        assert!(!cfg.palette.is_empty(), "palette restored");
    }
}
