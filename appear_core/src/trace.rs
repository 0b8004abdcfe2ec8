// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the observation pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! registry and engine call at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::detector::DetectorKind;
use crate::element::ElementId;
use crate::engine::{Direction, TransitionKind};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a registry builds a detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorCreatedEvent {
    /// Registry-local detector counter, starting at 1.
    pub generation: u32,
    /// Which implementation the factory produced.
    pub kind: DetectorKind,
    /// Number of threshold ratios in the options.
    pub threshold_count: u32,
    /// Whether a previous detector was disconnected to make room.
    pub replaced: bool,
}

/// Emitted when a registry disconnects its detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorDestroyedEvent {
    /// Generation of the detector that was torn down.
    pub generation: u32,
}

/// Emitted when a target is forwarded to the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserveEvent {
    /// Generation of the detector receiving the target.
    pub generation: u32,
    /// Whether a document was replaced by its root element.
    pub document_substituted: bool,
}

/// Emitted when a detector delivers a measurement batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchEvent {
    /// Generation of the delivering detector.
    pub generation: u32,
    /// Number of measurements in the batch.
    pub len: u32,
}

/// Emitted when the engine decides a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionEvent {
    /// The element that transitioned.
    pub element: ElementId,
    /// Appear or disappear.
    pub kind: TransitionKind,
    /// Scroll direction.
    pub direction: Direction,
    /// Intersection ratio of the deciding measurement.
    pub ratio: f64,
    /// Vertical position of the deciding measurement.
    pub y: f64,
}

/// Emitted when a transition would have fired but the once-flag blocked it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuppressedEvent {
    /// The element whose transition was suppressed.
    pub element: ElementId,
    /// The suppressed transition type.
    pub kind: TransitionKind,
    /// Intersection ratio of the measurement.
    pub ratio: f64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the observation pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a detector is created.
    fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
        _ = e;
    }

    /// Called after a detector is disconnected.
    fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        _ = e;
    }

    /// Called when a target is forwarded to the detector.
    fn on_observe(&mut self, e: &ObserveEvent) {
        _ = e;
    }

    /// Called before a measurement batch is evaluated.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }

    /// Called when a transition fires, before its notification is dispatched.
    fn on_transition(&mut self, e: &TransitionEvent) {
        _ = e;
    }

    /// Called when a transition is suppressed by the once-flag.
    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`DetectorCreatedEvent`].
    #[inline]
    pub fn detector_created(&mut self, e: &DetectorCreatedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_detector_created(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DetectorDestroyedEvent`].
    #[inline]
    pub fn detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_detector_destroyed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ObserveEvent`].
    #[inline]
    pub fn observe(&mut self, e: &ObserveEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_observe(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BatchEvent`].
    #[inline]
    pub fn batch(&mut self, e: &BatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransitionEvent`].
    #[inline]
    pub fn transition(&mut self, e: &TransitionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transition(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SuppressedEvent`].
    #[inline]
    pub fn suppressed(&mut self, e: &SuppressedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_suppressed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transition() -> TransitionEvent {
        TransitionEvent {
            element: ElementId(3),
            kind: TransitionKind::Appear,
            direction: Direction::Down,
            ratio: 0.5,
            y: 120.0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_transition(&sample_transition());
        sink.on_batch(&BatchEvent {
            generation: 1,
            len: 4,
        });
        sink.on_detector_destroyed(&DetectorDestroyedEvent { generation: 1 });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.transition(&sample_transition());
        tracer.observe(&ObserveEvent {
            generation: 1,
            document_substituted: false,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            elements: Vec<ElementId>,
        }
        impl TraceSink for RecordingSink {
            fn on_transition(&mut self, e: &TransitionEvent) {
                self.elements.push(e.element);
            }
        }

        let mut sink = RecordingSink {
            elements: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.transition(&sample_transition());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.elements, &[ElementId(3)]);
    }
}
