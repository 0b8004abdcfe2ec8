// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use appear_core::trace::{
    BatchEvent, DetectorCreatedEvent, DetectorDestroyedEvent, ObserveEvent, SuppressedEvent,
    TraceSink, TransitionEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
        let replaced = if e.replaced { " replaced" } else { "" };
        let _ = writeln!(
            self.writer,
            "[detector:create] gen={} kind={} thresholds={}{replaced}",
            e.generation,
            e.kind.as_str(),
            e.threshold_count,
        );
    }

    fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        let _ = writeln!(self.writer, "[detector:destroy] gen={}", e.generation);
    }

    fn on_observe(&mut self, e: &ObserveEvent) {
        let target = if e.document_substituted {
            "document root"
        } else {
            "element"
        };
        let _ = writeln!(self.writer, "[observe] gen={} {target}", e.generation);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let _ = writeln!(self.writer, "[batch] gen={} len={}", e.generation, e.len);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[{}] {:?} direction={} ratio={:.3} y={:.1}",
            e.kind.name(),
            e.element,
            e.direction.as_str(),
            e.ratio,
            e.y,
        );
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        let _ = writeln!(
            self.writer,
            "[suppressed] {:?} {} ratio={:.3} (once)",
            e.element,
            e.kind.name(),
            e.ratio,
        );
    }
}
