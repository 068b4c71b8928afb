// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use kurbo::Size;

use starfield_core::config::{QualityPreset, Rgba8};
use starfield_core::field::{FrameOutcome, LoopState};
use starfield_core::output::SurfaceId;
use starfield_core::policy::{DowngradeReason, QualityTier};
use starfield_core::sprite::SpriteKey;
use starfield_core::time::HostTime;
use starfield_core::trace::{
    FrameEvent, LoopStateEvent, PolicyEvent, ResizeEvent, SpriteEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_POLICY: u8 = 1;
const TAG_RESIZE: u8 = 2;
const TAG_FRAME: u8 = 3;
const TAG_LOOP_STATE: u8 = 4;
const TAG_SPRITE: u8 = 5;

const OUTCOME_PAUSED: u8 = 0;
const OUTCOME_THROTTLED: u8 = 1;
const OUTCOME_DRAWN: u8 = 2;

const FLAG_TWINKLE: u8 = 1 << 0;
const FLAG_REDUCED_MOTION: u8 = 1 << 1;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    events: usize,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        self.events += 1;
        self.write_u8(tag);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_state(&mut self, s: LoopState) {
        self.write_u8(match s {
            LoopState::Scheduled => 0,
            LoopState::Running => 1,
            LoopState::Paused => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_policy(&mut self, e: &PolicyEvent) {
        self.begin(TAG_POLICY);
        self.write_u32(e.surface.0);
        self.write_u8(match e.requested {
            QualityPreset::High => 0,
            QualityPreset::Balanced => 1,
            QualityPreset::Battery => 2,
        });
        self.write_u8(match e.tier {
            QualityTier::High => 0,
            QualityTier::Balanced => 1,
            QualityTier::Battery => 2,
        });
        self.write_u8(match e.downgrade {
            None => 0,
            Some(DowngradeReason::LowEndDevice) => 1,
            Some(DowngradeReason::DataSaver) => 2,
        });
        self.write_u32(e.fps_cap);
        self.write_f64(e.dpr_cap);
        self.write_u8(e.sprite_buckets);
        self.write_count(e.target_count);
        let mut flags = 0;
        if e.twinkle_enabled {
            flags |= FLAG_TWINKLE;
        }
        if e.reduced_motion {
            flags |= FLAG_REDUCED_MOTION;
        }
        self.write_u8(flags);
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.begin(TAG_RESIZE);
        self.write_u32(e.surface.0);
        self.write_f64(e.size.width);
        self.write_f64(e.size.height);
        self.write_count(e.previous_count);
        self.write_count(e.count);
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        self.begin(TAG_FRAME);
        self.write_u64(e.frame_index);
        self.write_u32(e.surface.0);
        self.write_u64(e.now.ticks());
        match e.outcome {
            FrameOutcome::Paused => {
                self.write_u8(OUTCOME_PAUSED);
                self.write_f64(0.0);
                self.write_count(0);
            }
            FrameOutcome::Throttled => {
                self.write_u8(OUTCOME_THROTTLED);
                self.write_f64(0.0);
                self.write_count(0);
            }
            FrameOutcome::Drawn { dt_ms, particles } => {
                self.write_u8(OUTCOME_DRAWN);
                self.write_f64(dt_ms);
                self.write_count(particles);
            }
        }
    }

    fn on_loop_state(&mut self, e: &LoopStateEvent) {
        self.begin(TAG_LOOP_STATE);
        self.write_u64(e.frame_index);
        self.write_u32(e.surface.0);
        self.write_u64(e.now.ticks());
        self.write_state(e.from);
        self.write_state(e.to);
    }

    fn on_sprite(&mut self, e: &SpriteEvent) {
        self.begin(TAG_SPRITE);
        self.write_u32(e.surface.0);
        let Rgba8 { r, g, b, a } = e.key.color;
        self.buf.extend_from_slice(&[r, g, b, a]);
        self.write_u8(e.key.bucket);
        self.write_u8(e.key.bucket_count);
        self.write_u32(e.side);
        self.write_count(e.cache_len);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PolicyEvent`].
    Policy(PolicyEvent),
    /// A [`ResizeEvent`].
    Resize(ResizeEvent),
    /// A [`FrameEvent`].
    Frame(FrameEvent),
    /// A [`LoopStateEvent`].
    LoopState(LoopStateEvent),
    /// A [`SpriteEvent`].
    Sprite(SpriteEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_count(&mut self) -> Option<usize> {
        Some(usize::try_from(self.read_u64()?).unwrap_or(usize::MAX))
    }

    fn read_state(&mut self) -> Option<LoopState> {
        Some(match self.read_u8()? {
            0 => LoopState::Scheduled,
            1 => LoopState::Running,
            _ => LoopState::Paused,
        })
    }

    fn decode_policy(&mut self) -> Option<RecordedEvent> {
        let surface = SurfaceId(self.read_u32()?);
        let requested = match self.read_u8()? {
            0 => QualityPreset::High,
            1 => QualityPreset::Balanced,
            _ => QualityPreset::Battery,
        };
        let tier = match self.read_u8()? {
            0 => QualityTier::High,
            1 => QualityTier::Balanced,
            _ => QualityTier::Battery,
        };
        let downgrade = match self.read_u8()? {
            0 => None,
            1 => Some(DowngradeReason::LowEndDevice),
            _ => Some(DowngradeReason::DataSaver),
        };
        let fps_cap = self.read_u32()?;
        let dpr_cap = self.read_f64()?;
        let sprite_buckets = self.read_u8()?;
        let target_count = self.read_count()?;
        let flags = self.read_u8()?;
        Some(RecordedEvent::Policy(PolicyEvent {
            surface,
            requested,
            tier,
            downgrade,
            fps_cap,
            dpr_cap,
            sprite_buckets,
            target_count,
            twinkle_enabled: flags & FLAG_TWINKLE != 0,
            reduced_motion: flags & FLAG_REDUCED_MOTION != 0,
        }))
    }

    fn decode_resize(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Resize(ResizeEvent {
            surface: SurfaceId(self.read_u32()?),
            size: Size::new(self.read_f64()?, self.read_f64()?),
            previous_count: self.read_count()?,
            count: self.read_count()?,
        }))
    }

    fn decode_frame(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let surface = SurfaceId(self.read_u32()?);
        let now = HostTime(self.read_u64()?);
        let kind = self.read_u8()?;
        let dt_ms = self.read_f64()?;
        let particles = self.read_count()?;
        let outcome = match kind {
            OUTCOME_PAUSED => FrameOutcome::Paused,
            OUTCOME_THROTTLED => FrameOutcome::Throttled,
            _ => FrameOutcome::Drawn { dt_ms, particles },
        };
        Some(RecordedEvent::Frame(FrameEvent {
            frame_index,
            surface,
            now,
            outcome,
        }))
    }

    fn decode_loop_state(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LoopState(LoopStateEvent {
            frame_index: self.read_u64()?,
            surface: SurfaceId(self.read_u32()?),
            now: HostTime(self.read_u64()?),
            from: self.read_state()?,
            to: self.read_state()?,
        }))
    }

    fn decode_sprite(&mut self) -> Option<RecordedEvent> {
        let surface = SurfaceId(self.read_u32()?);
        let [r, g, b, a] = self.take::<4>()?;
        Some(RecordedEvent::Sprite(SpriteEvent {
            surface,
            key: SpriteKey {
                color: Rgba8 { r, g, b, a },
                bucket: self.read_u8()?,
                bucket_count: self.read_u8()?,
            },
            side: self.read_u32()?,
            cache_len: self.read_count()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_POLICY => self.decode_policy(),
            TAG_RESIZE => self.decode_resize(),
            TAG_FRAME => self.decode_frame(),
            TAG_LOOP_STATE => self.decode_loop_state(),
            TAG_SPRITE => self.decode_sprite(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy() -> PolicyEvent {
        PolicyEvent {
            surface: SurfaceId(2),
            requested: QualityPreset::High,
            tier: QualityTier::Battery,
            downgrade: Some(DowngradeReason::LowEndDevice),
            fps_cap: 24,
            dpr_cap: 1.25,
            sprite_buckets: 4,
            target_count: 75,
            twinkle_enabled: true,
            reduced_motion: false,
        }
    }

    fn sample_frame() -> FrameEvent {
        FrameEvent {
            frame_index: 7,
            surface: SurfaceId(2),
            now: HostTime(116_667),
            outcome: FrameOutcome::Drawn {
                dt_ms: 16.667,
                particles: 75,
            },
        }
    }

    #[test]
    fn mixed_recording_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_policy(&sample_policy());
        rec.on_frame(&sample_frame());
        rec.on_loop_state(&LoopStateEvent {
            frame_index: 8,
            surface: SurfaceId(2),
            now: HostTime(133_333),
            from: LoopState::Running,
            to: LoopState::Paused,
        });
        rec.on_sprite(&SpriteEvent {
            surface: SurfaceId(2),
            key: SpriteKey {
                color: Rgba8::rgb(0x93, 0xc5, 0xfd),
                bucket: 3,
                bucket_count: 4,
            },
            side: 12,
            cache_len: 5,
        });
        assert_eq!(rec.event_count(), 4);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], RecordedEvent::Policy(sample_policy()));
        assert_eq!(events[1], RecordedEvent::Frame(sample_frame()));
        match &events[2] {
            RecordedEvent::LoopState(e) => {
                assert_eq!(e.from, LoopState::Running);
                assert_eq!(e.to, LoopState::Paused);
            }
            other => panic!("expected LoopState, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::Sprite(e) => {
                assert_eq!(e.key.color, Rgba8::rgb(0x93, 0xc5, 0xfd));
                assert_eq!(e.key.bucket, 3);
                assert_eq!(e.side, 12);
            }
            other => panic!("expected Sprite, got {other:?}"),
        }
    }

    #[test]
    fn throttled_frame_keeps_no_payload() {
        let mut rec = RecorderSink::new();
        rec.on_frame(&FrameEvent {
            outcome: FrameOutcome::Throttled,
            ..sample_frame()
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[0] {
            RecordedEvent::Frame(e) => assert_eq!(e.outcome, FrameOutcome::Throttled),
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn truncated_input_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_frame(&sample_frame());
        rec.on_frame(&sample_frame());
        let bytes = rec.into_bytes();
        let truncated = &bytes[..bytes.len() - 3];
        assert_eq!(decode(truncated).count(), 1, "partial record is dropped");
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut bytes = vec![0xff];
        let mut rec = RecorderSink::new();
        rec.on_frame(&sample_frame());
        bytes.extend_from_slice(rec.as_bytes());
        assert_eq!(decode(&bytes).count(), 0);
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
