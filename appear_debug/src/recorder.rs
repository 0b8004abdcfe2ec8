// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use appear_core::detector::DetectorKind;
use appear_core::element::ElementId;
use appear_core::engine::{Direction, TransitionKind};
use appear_core::trace::{
    BatchEvent, DetectorCreatedEvent, DetectorDestroyedEvent, ObserveEvent, SuppressedEvent,
    TraceSink, TransitionEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DETECTOR_CREATED: u8 = 1;
const TAG_DETECTOR_DESTROYED: u8 = 2;
const TAG_OBSERVE: u8 = 3;
const TAG_BATCH: u8 = 4;
const TAG_TRANSITION: u8 = 5;
const TAG_SUPPRESSED: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
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

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_kind(&mut self, k: TransitionKind) {
        self.write_u8(match k {
            TransitionKind::Appear => 0,
            TransitionKind::Disappear => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
        self.write_u8(TAG_DETECTOR_CREATED);
        self.write_u32(e.generation);
        self.write_u8(match e.kind {
            DetectorKind::Native => 0,
            DetectorKind::Fallback => 1,
        });
        self.write_u32(e.threshold_count);
        self.write_bool(e.replaced);
    }

    fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        self.write_u8(TAG_DETECTOR_DESTROYED);
        self.write_u32(e.generation);
    }

    fn on_observe(&mut self, e: &ObserveEvent) {
        self.write_u8(TAG_OBSERVE);
        self.write_u32(e.generation);
        self.write_bool(e.document_substituted);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.write_u8(TAG_BATCH);
        self.write_u32(e.generation);
        self.write_u32(e.len);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.write_u8(TAG_TRANSITION);
        self.write_u32(e.element.0);
        self.write_kind(e.kind);
        self.write_u8(match e.direction {
            Direction::Up => 0,
            Direction::Down => 1,
        });
        self.write_f64(e.ratio);
        self.write_f64(e.y);
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        self.write_u8(TAG_SUPPRESSED);
        self.write_u32(e.element.0);
        self.write_kind(e.kind);
        self.write_f64(e.ratio);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`DetectorCreatedEvent`].
    DetectorCreated(DetectorCreatedEvent),
    /// A [`DetectorDestroyedEvent`].
    DetectorDestroyed(DetectorDestroyedEvent),
    /// An [`ObserveEvent`].
    Observe(ObserveEvent),
    /// A [`BatchEvent`].
    Batch(BatchEvent),
    /// A [`TransitionEvent`].
    Transition(TransitionEvent),
    /// A [`SuppressedEvent`].
    Suppressed(SuppressedEvent),
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
///
/// Iteration stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_kind(&mut self) -> Option<TransitionKind> {
        Some(match self.read_u8()? {
            0 => TransitionKind::Appear,
            _ => TransitionKind::Disappear,
        })
    }

    fn decode_detector_created(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DetectorCreated(DetectorCreatedEvent {
            generation: self.read_u32()?,
            kind: match self.read_u8()? {
                0 => DetectorKind::Native,
                _ => DetectorKind::Fallback,
            },
            threshold_count: self.read_u32()?,
            replaced: self.read_bool()?,
        }))
    }

    fn decode_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Transition(TransitionEvent {
            element: ElementId(self.read_u32()?),
            kind: self.read_kind()?,
            direction: match self.read_u8()? {
                0 => Direction::Up,
                _ => Direction::Down,
            },
            ratio: self.read_f64()?,
            y: self.read_f64()?,
        }))
    }

    fn decode_suppressed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Suppressed(SuppressedEvent {
            element: ElementId(self.read_u32()?),
            kind: self.read_kind()?,
            ratio: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_DETECTOR_CREATED => self.decode_detector_created(),
            TAG_DETECTOR_DESTROYED => Some(RecordedEvent::DetectorDestroyed(
                DetectorDestroyedEvent {
                    generation: self.read_u32()?,
                },
            )),
            TAG_OBSERVE => Some(RecordedEvent::Observe(ObserveEvent {
                generation: self.read_u32()?,
                document_substituted: self.read_bool()?,
            })),
            TAG_BATCH => Some(RecordedEvent::Batch(BatchEvent {
                generation: self.read_u32()?,
                len: self.read_u32()?,
            })),
            TAG_TRANSITION => self.decode_transition(),
            TAG_SUPPRESSED => self.decode_suppressed(),
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

    fn session(rec: &mut RecorderSink) {
        rec.on_detector_created(&DetectorCreatedEvent {
            generation: 1,
            kind: DetectorKind::Fallback,
            threshold_count: 10,
            replaced: false,
        });
        rec.on_observe(&ObserveEvent {
            generation: 1,
            document_substituted: false,
        });
        rec.on_batch(&BatchEvent {
            generation: 1,
            len: 2,
        });
        rec.on_transition(&TransitionEvent {
            element: ElementId(4),
            kind: TransitionKind::Appear,
            direction: Direction::Up,
            ratio: 0.25,
            y: -12.5,
        });
        rec.on_suppressed(&SuppressedEvent {
            element: ElementId(5),
            kind: TransitionKind::Disappear,
            ratio: 0.0,
        });
        rec.on_detector_destroyed(&DetectorDestroyedEvent { generation: 1 });
    }

    #[test]
    fn recorded_session_decodes_in_order() {
        let mut rec = RecorderSink::new();
        session(&mut rec);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            events[0],
            RecordedEvent::DetectorCreated(DetectorCreatedEvent {
                kind: DetectorKind::Fallback,
                threshold_count: 10,
                replaced: false,
                ..
            })
        ));
        match &events[3] {
            RecordedEvent::Transition(e) => {
                assert_eq!(e.element, ElementId(4));
                assert_eq!(e.direction, Direction::Up);
                assert_eq!(e.y, -12.5);
            }
            other => panic!("expected Transition, got {other:?}"),
        }
        assert_eq!(
            events[5],
            RecordedEvent::DetectorDestroyed(DetectorDestroyedEvent { generation: 1 })
        );
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        session(&mut rec);
        let bytes = rec.into_bytes();
        // Cut the final record in half.
        let events: Vec<_> = decode(&bytes[..bytes.len() - 2]).collect();
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_batch(&BatchEvent {
            generation: 2,
            len: 0,
        });
        let mut bytes = rec.into_bytes();
        bytes.push(0xFF);
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(decode(&bytes).count(), 1);
    }
}
