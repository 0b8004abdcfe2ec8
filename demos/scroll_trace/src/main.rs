// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted scroll session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Lays out a column of cards on a simulated page, scrolls to the bottom and
//! back, and prints every delivered notification. Trace events go to both a
//! [`PrettyPrintSink`](appear_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](appear_debug::recorder::RecorderSink); the recording is
//! then exported as `trace.json`.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use appear_core::registry::Registry;
use appear_core::trace::{
    BatchEvent, DetectorCreatedEvent, DetectorDestroyedEvent, ObserveEvent, SuppressedEvent,
    TraceSink, TransitionEvent,
};
use appear_debug::pretty::PrettyPrintSink;
use appear_debug::recorder::RecorderSink;
use appear_harness::Scene;
use kurbo::{Rect, Size};

const VIEWPORT: Size = Size::new(800.0, 600.0);
const CARD_COUNT: u32 = 8;
const CARD_HEIGHT: f64 = 300.0;
const CARD_GAP: f64 = 100.0;
const SCROLL_STEP: f64 = 120.0;
/// Every card at this index is marked `data-once`.
const ONCE_EVERY: u32 = 3;

/// Forwards every event to both sinks.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
        self.pretty.on_detector_created(e);
        self.recorder.on_detector_created(e);
    }

    fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
        self.pretty.on_detector_destroyed(e);
        self.recorder.on_detector_destroyed(e);
    }

    fn on_observe(&mut self, e: &ObserveEvent) {
        self.pretty.on_observe(e);
        self.recorder.on_observe(e);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.pretty.on_batch(e);
        self.recorder.on_batch(e);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.pretty.on_transition(e);
        self.recorder.on_transition(e);
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        self.pretty.on_suppressed(e);
        self.recorder.on_suppressed(e);
    }
}

fn main() {
    // -- page --------------------------------------------------------------
    let scene = Scene::new(VIEWPORT);
    let cards: Vec<_> = (0..CARD_COUNT)
        .map(|i| {
            let top = CARD_GAP + f64::from(i) * (CARD_HEIGHT + CARD_GAP);
            let card = scene.add_element(Rect::new(40.0, top, 760.0, top + CARD_HEIGHT));
            if i % ONCE_EVERY == ONCE_EVERY - 1 {
                scene.set_attribute(card, "data-once", "true");
            }
            card
        })
        .collect();
    let page_height = CARD_GAP + f64::from(CARD_COUNT) * (CARD_HEIGHT + CARD_GAP);
    let max_scroll = page_height - VIEWPORT.height;

    // -- registry ----------------------------------------------------------
    let sink = Rc::new(RefCell::new(Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: RecorderSink::new(),
    }));
    let mut registry = Registry::with_sink(scene.factory(), scene.host(), sink.clone());
    for card in &cards {
        registry.observe_element(card);
    }

    // -- scripted scroll ---------------------------------------------------
    let mut positions = Vec::new();
    let mut y = 0.0;
    while y < max_scroll {
        positions.push(y);
        y += SCROLL_STEP;
    }
    positions.push(max_scroll);
    let down = positions.clone();
    positions.extend(down.iter().rev().skip(1));

    for &y in &positions {
        scene.scroll_to(y);
        scene.flush();
        for delivery in scene.take_deliveries() {
            println!(
                "  scroll_y={y:>6.1} card #{} -> {} ({})",
                delivery.target.0,
                delivery.notification.name(),
                delivery.notification.direction.as_str(),
            );
        }
    }

    registry.destroy();

    // -- export ------------------------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    appear_debug::json::export(sink.borrow().recorder.as_bytes(), &mut writer)
        .expect("failed to write trace");

    println!(
        "Wrote {path} ({} scroll steps, {} cards)",
        positions.len(),
        cards.len()
    );
}
