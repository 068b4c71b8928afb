// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each surface becomes one process (`pid`). Drawn frames are instant events
//! plus a `particles` counter track; loop state changes are global instants.
//! Policy, resize and sprite events carry no host time of their own, so they
//! are stamped with the time of the most recent frame (or 0 before the first).
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use starfield_core::field::FrameOutcome;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are already microseconds and are written unchanged.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0_u64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Policy(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Policy",
                    "cat": "Policy",
                    "ts": last_ts,
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "requested": e.requested.as_str(),
                        "tier": format!("{:?}", e.tier),
                        "downgrade": e.downgrade.map(|r| format!("{r:?}")),
                        "fps_cap": e.fps_cap,
                        "dpr_cap": e.dpr_cap,
                        "sprite_buckets": e.sprite_buckets,
                        "target_count": e.target_count,
                        "twinkle": e.twinkle_enabled,
                        "reduced_motion": e.reduced_motion,
                    }
                }));
            }
            RecordedEvent::Resize(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Resize",
                    "cat": "Surface",
                    "ts": last_ts,
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "width": e.size.width,
                        "height": e.size.height,
                        "previous_count": e.previous_count,
                        "count": e.count,
                    }
                }));
            }
            RecordedEvent::Frame(e) => {
                last_ts = e.now.ticks();
                match e.outcome {
                    FrameOutcome::Drawn { dt_ms, particles } => {
                        events.push(json!({
                            "ph": "i",
                            "name": "Frame",
                            "cat": "Frame",
                            "ts": last_ts,
                            "pid": e.surface.0,
                            "tid": 0,
                            "s": "t",
                            "args": {
                                "frame_index": e.frame_index,
                                "dt_ms": dt_ms,
                            }
                        }));
                        events.push(json!({
                            "ph": "C",
                            "name": "particles",
                            "ts": last_ts,
                            "pid": e.surface.0,
                            "args": { "particles": particles }
                        }));
                    }
                    // Skipped ticks would swamp the timeline; state
                    // changes already mark where pauses begin and end.
                    FrameOutcome::Throttled | FrameOutcome::Paused => {}
                }
            }
            RecordedEvent::LoopState(e) => {
                last_ts = e.now.ticks();
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.to),
                    "cat": "Loop",
                    "ts": last_ts,
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "from": format!("{:?}", e.from),
                    }
                }));
            }
            RecordedEvent::Sprite(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SpriteBuilt",
                    "cat": "Sprite",
                    "ts": last_ts,
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "color": format!("{:?}", e.key.color),
                        "bucket": e.key.bucket,
                        "bucket_count": e.key.bucket_count,
                        "side": e.side,
                        "cache_len": e.cache_len,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use starfield_core::field::LoopState;
    use starfield_core::output::SurfaceId;
    use starfield_core::time::HostTime;
    use starfield_core::trace::{FrameEvent, LoopStateEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame(&FrameEvent {
            frame_index: 0,
            surface: SurfaceId(0),
            now: HostTime(1_000),
            outcome: FrameOutcome::Drawn {
                dt_ms: 0.0,
                particles: 100,
            },
        });
        rec.on_frame(&FrameEvent {
            frame_index: 1,
            surface: SurfaceId(0),
            now: HostTime(17_667),
            outcome: FrameOutcome::Throttled,
        });
        rec.on_loop_state(&LoopStateEvent {
            frame_index: 2,
            surface: SurfaceId(0),
            now: HostTime(34_333),
            from: LoopState::Running,
            to: LoopState::Paused,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3, "drawn frame + counter + state change");

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Frame");
        assert_eq!(parsed[0]["ts"], 1_000);

        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["args"]["particles"], 100);

        assert_eq!(parsed[2]["name"], "Paused");
        assert_eq!(parsed[2]["args"]["from"], "Running");
        assert_eq!(parsed[2]["ts"], 34_333);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
