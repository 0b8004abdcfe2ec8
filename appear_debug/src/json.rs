// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes a JSON array of instant events in [Chrome Trace Event
//! Format][format] to the given writer.
//!
//! Recordings carry no timestamps, so each event's `ts` is its position in
//! the recording. Detector lifecycle events go on track 0; transitions and
//! suppressions go on a track per element.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a JSON array.
///
/// The output is suitable for loading into `chrome://tracing` or
/// [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        let event = match recorded {
            RecordedEvent::DetectorCreated(e) => json!({
                "ph": "i",
                "name": "DetectorCreated",
                "cat": "Registry",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "generation": e.generation,
                    "kind": e.kind.as_str(),
                    "thresholds": e.threshold_count,
                    "replaced": e.replaced,
                }
            }),
            RecordedEvent::DetectorDestroyed(e) => json!({
                "ph": "i",
                "name": "DetectorDestroyed",
                "cat": "Registry",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "generation": e.generation,
                }
            }),
            RecordedEvent::Observe(e) => json!({
                "ph": "i",
                "name": "Observe",
                "cat": "Registry",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "generation": e.generation,
                    "document_substituted": e.document_substituted,
                }
            }),
            RecordedEvent::Batch(e) => json!({
                "ph": "i",
                "name": "Batch",
                "cat": "Detector",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "generation": e.generation,
                    "len": e.len,
                }
            }),
            RecordedEvent::Transition(e) => json!({
                "ph": "i",
                "name": e.kind.name(),
                "cat": "Transition",
                "ts": ts,
                "pid": 0,
                "tid": e.element.0,
                "s": "t",
                "args": {
                    "direction": e.direction.as_str(),
                    "ratio": e.ratio,
                    "y": e.y,
                }
            }),
            RecordedEvent::Suppressed(e) => json!({
                "ph": "i",
                "name": format!("{} (suppressed)", e.kind.name()),
                "cat": "Transition",
                "ts": ts,
                "pid": 0,
                "tid": e.element.0,
                "s": "t",
                "args": {
                    "ratio": e.ratio,
                }
            }),
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
