// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for appear.
//!
//! This crate wires [`appear_core`] to the DOM:
//!
//! - [`NativeDetector`]: `IntersectionObserver`-backed detector
//! - [`DomFallbackDetector`]: scroll/resize driven geometry checks for
//!   browsers without a usable `IntersectionObserver`
//! - [`WebDetectorFactory`]: probes the browser once and builds either
//! - [`DomHost`]: element identity, attribute reads, and `CustomEvent`
//!   delivery
//! - [`ConsoleSink`]: trace sink that logs to the browser console
//! - [`AppearObserver`]: the JS-facing `create` / `observe` / `destroy` API

#![no_std]

extern crate alloc;

mod console;
mod factory;
mod fallback;
mod host;
mod native;
mod observer;

pub use console::ConsoleSink;
pub use factory::{WebDetector, WebDetectorFactory};
pub use fallback::DomFallbackDetector;
pub use host::DomHost;
pub use native::NativeDetector;
pub use observer::AppearObserver;

use appear_core::detector::Capabilities;
use appear_core::registry::Registry;
use js_sys::Reflect;
use kurbo::Rect;
use wasm_bindgen::JsValue;
use web_sys::DomRectReadOnly;

/// A [`Registry`] backed by the browser.
pub type WebRegistry = Registry<WebDetectorFactory, DomHost>;

/// Probes the global object for a usable `IntersectionObserver`.
///
/// The entry type must be present and its prototype must expose
/// `intersectionRatio`; some early implementations shipped without it.
#[must_use]
pub fn probe_capabilities() -> Capabilities {
    let global: JsValue = js_sys::global().into();
    let intersection_observer = has(&global, "IntersectionObserver");
    let intersection_observer_entry = has(&global, "IntersectionObserverEntry");
    let entry_intersection_ratio = intersection_observer_entry
        && Reflect::get(&global, &JsValue::from_str("IntersectionObserverEntry"))
            .and_then(|ctor| Reflect::get(&ctor, &JsValue::from_str("prototype")))
            .is_ok_and(|proto| has(&proto, "intersectionRatio"));
    Capabilities {
        intersection_observer,
        intersection_observer_entry,
        entry_intersection_ratio,
    }
}

fn has(target: &JsValue, name: &str) -> bool {
    target.is_object() && Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

/// Converts a DOM rectangle to a [`Rect`].
pub(crate) fn to_rect(rect: &DomRectReadOnly) -> Rect {
    Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom())
}
