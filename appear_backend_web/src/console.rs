// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace sink that writes to the browser console.

use alloc::format;

use appear_core::trace::{
    DetectorCreatedEvent, DetectorDestroyedEvent, SuppressedEvent, TraceSink, TransitionEvent,
};
use wasm_bindgen::JsValue;

/// Logs detector lifecycle and transition events with `console.log`.
///
/// Per-batch and per-observe events are not logged; they fire on every
/// scroll.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

fn log(line: &str) {
    web_sys::console::log_1(&JsValue::from_str(line));
}

impl TraceSink for ConsoleSink {
    fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
        log(&format!(
            "[appear] detector #{} created: {} ({} thresholds{})",
            e.generation,
            e.kind.as_str(),
            e.threshold_count,
            if e.replaced { ", replaced previous" } else { "" },
        ));
    }

    fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        log(&format!("[appear] detector #{} destroyed", e.generation));
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        log(&format!(
            "[appear] {:?} {} {} ratio={:.3} y={:.1}",
            e.element,
            e.kind.name(),
            e.direction.as_str(),
            e.ratio,
            e.y,
        ));
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        log(&format!(
            "[appear] {:?} {} suppressed (once) ratio={:.3}",
            e.element,
            e.kind.name(),
            e.ratio,
        ));
    }
}
