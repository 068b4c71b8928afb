// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated starfield loop that exercises the tracing and diagnostics
//! pipeline.
//!
//! Drives one field over the software [`PixelSurface`] with a synthetic
//! 60 Hz clock, walking through the situations a browser would produce: a
//! hidden tab, a resize, a data-saver change and a reduced-motion change.
//! Events go to both a
//! [`PrettyPrintSink`](starfield_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](starfield_debug::recorder::RecorderSink), and the
//! recording is exported as a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use kurbo::Size;

use starfield_core::config::{FieldConfig, QualityPreset};
use starfield_core::field::ParticleField;
use starfield_core::output::SurfaceId;
use starfield_core::policy::EnvironmentSignals;
use starfield_core::raster::{GlowBitmap, PixelSurface};
use starfield_core::time::HostTime;
use starfield_core::timing::FrameTick;
use starfield_core::trace::Tracer;

use starfield_debug::Fanout;
use starfield_debug::pretty::PrettyPrintSink;
use starfield_debug::recorder::RecorderSink;

/// One refresh at 60 Hz, in microseconds.
const REFRESH_US: u64 = 16_667;
const FRAMES_PER_PHASE: u64 = 60;
const SURFACE: SurfaceId = SurfaceId(0);

/// Feeds ticks to one field, keeping the clock and frame counter.
struct Sim {
    field: ParticleField<GlowBitmap>,
    surface: PixelSurface,
    frame_index: u64,
    now: HostTime,
}

impl Sim {
    fn run(&mut self, frames: u64, tracer: &mut Tracer<'_>) {
        for _ in 0..frames {
            let tick = FrameTick {
                now: self.now,
                frame_index: self.frame_index,
                surface: SURFACE,
            };
            self.field.on_frame(&tick, &mut self.surface, tracer);
            self.frame_index += 1;
            self.now = HostTime(self.now.ticks() + REFRESH_US);
        }
    }

    fn resize(&mut self, size: Size, tracer: &mut Tracer<'_>) {
        self.field.resize(size, tracer);
        self.surface.resize(size, self.field.effective_dpr());
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut sinks = Fanout(
        PrettyPrintSink::new(Box::new(std::io::stdout())),
        RecorderSink::new(),
    );
    let mut tracer = Tracer::new(&mut sinks);

    // -- field -------------------------------------------------------------
    let config = FieldConfig {
        quality: QualityPreset::Balanced,
        ..FieldConfig::default()
    };
    let signals = EnvironmentSignals {
        device_memory_gb: Some(8.0),
        hardware_concurrency: Some(8),
        device_pixel_ratio: 2.0,
        intersection_observer: true,
        ..EnvironmentSignals::default()
    };
    let size = Size::new(1280.0, 720.0);
    let field = ParticleField::new(SURFACE, &config, signals, size, 0x5eed, &mut tracer);
    let surface = PixelSurface::new(size, field.effective_dpr());
    let mut sim = Sim {
        field,
        surface,
        frame_index: 0,
        now: HostTime(1_000_000), // start at 1s
    };

    // -- scenario ----------------------------------------------------------
    sim.run(FRAMES_PER_PHASE, &mut tracer);

    sim.field.set_tab_hidden(true);
    sim.run(FRAMES_PER_PHASE / 2, &mut tracer);
    sim.field.set_tab_hidden(false);
    sim.run(FRAMES_PER_PHASE, &mut tracer);

    sim.resize(Size::new(640.0, 360.0), &mut tracer);
    sim.run(FRAMES_PER_PHASE, &mut tracer);

    sim.field.set_save_data(Some(true), &mut tracer);
    sim.run(FRAMES_PER_PHASE, &mut tracer);

    sim.field.set_reduced_motion(true, &mut tracer);
    sim.run(FRAMES_PER_PHASE, &mut tracer);

    drop(tracer);
    let Fanout(_, recorder) = sinks;

    println!(
        "{} frames, {} particles, {} sprites, {} events recorded",
        sim.frame_index,
        sim.field.store().len(),
        sim.field.sprite_count(),
        recorder.event_count(),
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    starfield_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
