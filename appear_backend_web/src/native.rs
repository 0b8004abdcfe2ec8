// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver`-backed detector.
//!
//! Each observer callback's entry list becomes one measurement batch, in the
//! order the browser reports the entries.

use alloc::string::ToString;
use alloc::vec::Vec;

use appear_core::detector::Detector;
use appear_core::measurement::Measurement;
use appear_core::options::ObserverOptions;
use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::factory::SharedBatch;
use crate::to_rect;

type EntriesClosure = Closure<dyn FnMut(Array)>;

/// A detector that delegates to the browser's `IntersectionObserver`.
pub struct NativeDetector {
    observer: IntersectionObserver,
    /// Kept alive for as long as the observer may call it.
    _closure: EntriesClosure,
}

impl NativeDetector {
    /// Builds an observer for `options` that forwards batches to `on_batch`.
    ///
    /// Fails if the browser rejects the options or the constructor throws.
    pub(crate) fn new(
        on_batch: SharedBatch,
        options: &ObserverOptions<Element>,
    ) -> Result<Self, JsValue> {
        let closure: EntriesClosure = Closure::new(move |entries: Array| {
            let batch: Vec<Measurement<Element>> = entries
                .iter()
                .map(|entry| measurement(&entry.unchecked_into()))
                .collect();
            let mut on_batch = on_batch.borrow_mut();
            (*on_batch)(&batch);
        });

        let init = IntersectionObserverInit::new();
        // `root` accepts an element or a document, so it is set untyped.
        let null = JsValue::NULL;
        let root: &JsValue = options.root.as_ref().map_or(&null, |root| root.as_ref());
        Reflect::set(&init, &JsValue::from_str("root"), root)?;
        init.set_root_margin(&options.root_margin.to_string());
        let thresholds: Array = options
            .threshold
            .values()
            .iter()
            .map(|&t| JsValue::from_f64(t))
            .collect();
        init.set_threshold(&thresholds);

        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }
}

impl Detector for NativeDetector {
    type Element = Element;

    fn observe(&mut self, element: &Element) {
        self.observer.observe(element);
    }

    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

impl Drop for NativeDetector {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for NativeDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeDetector")
            .field("observer", &"IntersectionObserver")
            .finish_non_exhaustive()
    }
}

fn measurement(entry: &IntersectionObserverEntry) -> Measurement<Element> {
    Measurement {
        target: entry.target(),
        bounding_client_rect: to_rect(&entry.bounding_client_rect()),
        intersection_ratio: entry.intersection_ratio(),
        intersection_rect: to_rect(&entry.intersection_rect()),
        is_intersecting: entry.is_intersecting(),
    }
}
