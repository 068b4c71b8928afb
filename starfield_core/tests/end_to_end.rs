// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-field scenarios driven through the software surface.

use kurbo::Size;
use starfield_core::config::{FieldConfig, QualityPreset};
use starfield_core::field::{FrameOutcome, LoopState, ParticleField};
use starfield_core::output::SurfaceId;
use starfield_core::particle::{ALPHA_MAX, ALPHA_MIN};
use starfield_core::policy::{EnvironmentSignals, QualityTier};
use starfield_core::raster::{GlowBitmap, PixelSurface};
use starfield_core::time::HostTime;
use starfield_core::timing::FrameTick;
use starfield_core::trace::Tracer;

const FRAME_US: u64 = 16_667;

fn desktop() -> EnvironmentSignals {
    EnvironmentSignals {
        device_memory_gb: Some(8.0),
        hardware_concurrency: Some(8),
        device_pixel_ratio: 1.0,
        intersection_observer: true,
        ..EnvironmentSignals::default()
    }
}

fn mount(
    config: &FieldConfig,
    signals: EnvironmentSignals,
    size: Size,
) -> (ParticleField<GlowBitmap>, PixelSurface) {
    let field = ParticleField::new(SurfaceId(1), config, signals, size, 42, &mut Tracer::none());
    let surface = PixelSurface::new(size, field.effective_dpr());
    (field, surface)
}

fn run(field: &mut ParticleField<GlowBitmap>, surface: &mut PixelSurface, frames: u64) {
    let mut tracer = Tracer::none();
    for i in 0..frames {
        let tick = FrameTick {
            now: HostTime(i * FRAME_US),
            frame_index: i,
            surface: SurfaceId(1),
        };
        field.on_frame(&tick, surface, &mut tracer);
    }
}

#[test]
fn base_area_keeps_configured_count() {
    let (field, _) = mount(&FieldConfig::default(), desktop(), Size::new(1280.0, 720.0));
    assert_eq!(field.store().len(), 100);
}

#[test]
fn quarter_area_halves_count() {
    let (field, _) = mount(&FieldConfig::default(), desktop(), Size::new(640.0, 360.0));
    assert_eq!(field.store().len(), 50);
}

#[test]
fn low_memory_device_runs_battery_tier() {
    let signals = EnvironmentSignals {
        device_memory_gb: Some(2.0),
        ..desktop()
    };
    let config = FieldConfig {
        quality: QualityPreset::High,
        ..FieldConfig::default()
    };
    let (field, _) = mount(&config, signals, Size::new(1280.0, 720.0));
    assert_eq!(field.policy().tier, QualityTier::Battery);
    assert!(field.policy().fps_cap <= 24, "battery fps cap");
    assert_eq!(field.store().len(), 60);
}

#[test]
fn long_run_keeps_invariants() {
    let size = Size::new(400.0, 300.0);
    let config = FieldConfig::default();
    let (mut field, mut surface) = mount(&config, desktop(), size);
    run(&mut field, &mut surface, 2_000);

    let margin = config.wrap_margin;
    for p in field.store().particles() {
        assert!(
            (-margin..=size.width + margin).contains(&p.position.x),
            "x {} escaped",
            p.position.x
        );
        assert!(
            (-margin..=size.height + margin).contains(&p.position.y),
            "y {} escaped",
            p.position.y
        );
        assert!((ALPHA_MIN..=ALPHA_MAX).contains(&p.alpha), "alpha {}", p.alpha);
    }
    assert!(
        field.sprite_count() <= config.palette.len() * usize::from(field.policy().sprite_buckets),
        "sprite cache stays bounded"
    );
    assert_eq!(surface.draw_calls(), field.store().len());
}

#[test]
fn resize_then_draw_uses_new_count() {
    let (mut field, mut surface) = mount(&FieldConfig::default(), desktop(), Size::new(1280.0, 720.0));
    run(&mut field, &mut surface, 3);
    let small = Size::new(640.0, 360.0);
    field.resize(small, &mut Tracer::none());
    surface.resize(small, field.effective_dpr());
    let tick = FrameTick {
        now: HostTime(10 * FRAME_US),
        frame_index: 10,
        surface: SurfaceId(1),
    };
    let outcome = field.on_frame(&tick, &mut surface, &mut Tracer::none());
    assert!(
        matches!(outcome, FrameOutcome::Drawn { particles: 50, .. }),
        "{outcome:?}"
    );
}

#[test]
fn mounted_hidden_starts_paused() {
    let signals = EnvironmentSignals {
        document_hidden: true,
        ..desktop()
    };
    let (mut field, mut surface) = mount(&FieldConfig::default(), signals, Size::new(200.0, 200.0));
    run(&mut field, &mut surface, 5);
    assert_eq!(field.state(), LoopState::Paused);
    assert_eq!(surface.draw_calls(), 0, "nothing drawn while hidden");
}

#[cfg(feature = "trace")]
mod traced {
    use super::*;
    use starfield_core::trace::{FrameEvent, LoopStateEvent, PolicyEvent, SpriteEvent, TraceSink};

    #[derive(Default)]
    struct Counts {
        policies: usize,
        drawn: usize,
        throttled: usize,
        paused: usize,
        states: Vec<(LoopState, LoopState)>,
        sprites: usize,
    }

    impl TraceSink for Counts {
        fn on_policy(&mut self, _: &PolicyEvent) {
            self.policies += 1;
        }
        fn on_frame(&mut self, e: &FrameEvent) {
            match e.outcome {
                FrameOutcome::Drawn { .. } => self.drawn += 1,
                FrameOutcome::Throttled => self.throttled += 1,
                FrameOutcome::Paused => self.paused += 1,
            }
        }
        fn on_loop_state(&mut self, e: &LoopStateEvent) {
            self.states.push((e.from, e.to));
        }
        fn on_sprite(&mut self, _: &SpriteEvent) {
            self.sprites += 1;
        }
    }

    #[test]
    fn trace_reports_every_tick_and_transition() {
        let mut counts = Counts::default();
        let size = Size::new(320.0, 240.0);
        let mut field: ParticleField<GlowBitmap> = ParticleField::new(
            SurfaceId(2),
            &FieldConfig {
                max_fps: 30,
                ..FieldConfig::default()
            },
            desktop(),
            size,
            1,
            &mut Tracer::new(&mut counts),
        );
        let mut surface = PixelSurface::new(size, 1.0);
        for i in 0..10 {
            if i == 6 {
                field.set_tab_hidden(true);
            }
            let tick = FrameTick {
                now: HostTime(i * FRAME_US),
                frame_index: i,
                surface: SurfaceId(2),
            };
            field.on_frame(&tick, &mut surface, &mut Tracer::new(&mut counts));
        }
        assert_eq!(counts.policies, 1);
        assert_eq!(counts.drawn, 3, "ticks 0, 2 and 4");
        assert_eq!(counts.throttled, 3);
        assert_eq!(counts.paused, 4);
        assert_eq!(
            counts.states,
            vec![
                (LoopState::Scheduled, LoopState::Running),
                (LoopState::Running, LoopState::Paused),
            ]
        );
        assert_eq!(counts.sprites, field.sprite_count());
    }
}
