// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry fallback for browsers without `IntersectionObserver`.
//!
//! [`DomFallbackDetector`] listens for `scroll` (in the capture phase, so
//! scrolling containers are seen too) and `resize` on the window. Each event
//! schedules at most one check on the next animation frame; observing a new
//! element schedules one as well. The check itself is
//! [`FallbackDetector::check`] over live `getBoundingClientRect` values.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use appear_core::detector::Detector;
use appear_core::fallback::{FallbackDetector, GeometrySource};
use appear_core::options::ObserverOptions;
use kurbo::Rect;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, Window};

use crate::factory::SharedBatch;
use crate::to_rect;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

const EVENTS: [(&str, bool); 2] = [("scroll", true), ("resize", false)];

type FrameClosure = Closure<dyn FnMut(f64)>;
type EventClosure = Closure<dyn FnMut(Event)>;

/// A detector that polls element geometry on scroll and resize.
pub struct DomFallbackDetector {
    inner: Rc<Inner>,
}

struct Inner {
    detector: RefCell<FallbackDetector<Element>>,
    on_batch: SharedBatch,
    root: Option<Element>,
    window: Option<Window>,
    document: Option<Document>,

    /// Registered with `requestAnimationFrame` whenever a check is pending.
    frame: RefCell<Option<FrameClosure>>,
    /// Registered for every entry of [`EVENTS`].
    listener: RefCell<Option<EventClosure>>,
    /// The pending frame request, if any.
    frame_id: Cell<Option<i32>>,
    connected: Cell<bool>,
}

impl DomFallbackDetector {
    /// Starts listening for scroll and resize on the current window.
    pub(crate) fn new(on_batch: SharedBatch, options: &ObserverOptions<Element>) -> Self {
        let window = web_sys::window();
        let document = window.as_ref().and_then(Window::document);
        let inner = Rc::new(Inner {
            detector: RefCell::new(FallbackDetector::new(options)),
            on_batch,
            root: options.root.clone(),
            window,
            document,
            frame: RefCell::new(None),
            listener: RefCell::new(None),
            frame_id: Cell::new(None),
            connected: Cell::new(true),
        });

        let weak = Rc::downgrade(&inner);
        let frame: FrameClosure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.frame_id.set(None);
                inner.run_check();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.frame.borrow_mut() = Some(frame);

        let weak = Rc::downgrade(&inner);
        let listener: EventClosure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                inner.schedule();
            }
        }) as Box<dyn FnMut(Event)>);
        if let Some(window) = &inner.window {
            for (name, capture) in EVENTS {
                let _ = window.add_event_listener_with_callback_and_bool(
                    name,
                    listener.as_ref().unchecked_ref(),
                    capture,
                );
            }
        }
        *inner.listener.borrow_mut() = Some(listener);

        Self { inner }
    }

    /// Number of observed elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.detector.borrow().len()
    }

    /// Returns `true` if nothing is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.detector.borrow().is_empty()
    }
}

impl Inner {
    /// Requests an animation frame unless one is already pending.
    fn schedule(&self) {
        if !self.connected.get() || self.frame_id.get().is_some() {
            return;
        }
        if let Some(frame) = &*self.frame.borrow() {
            let id = request_animation_frame(frame.as_ref().unchecked_ref());
            self.frame_id.set(Some(id));
        }
    }

    fn run_check(&self) {
        if !self.connected.get() {
            return;
        }
        let geometry = DomGeometry {
            root: self.root.as_ref(),
            document: self.document.as_ref(),
        };
        let batch = self.detector.borrow_mut().check(&geometry);
        if batch.is_empty() {
            return;
        }
        let mut on_batch = self.on_batch.borrow_mut();
        (*on_batch)(&batch);
    }

    fn shutdown(&self) {
        self.connected.set(false);
        if let Some(id) = self.frame_id.take() {
            cancel_animation_frame(id);
        }
        if let (Some(window), Some(listener)) = (&self.window, &*self.listener.borrow()) {
            for (name, capture) in EVENTS {
                let _ = window.remove_event_listener_with_callback_and_bool(
                    name,
                    listener.as_ref().unchecked_ref(),
                    capture,
                );
            }
        }
        self.detector.borrow_mut().disconnect();
    }
}

impl Detector for DomFallbackDetector {
    type Element = Element;

    fn observe(&mut self, element: &Element) {
        if !self.inner.connected.get() {
            return;
        }
        self.inner.detector.borrow_mut().observe(element);
        if self.inner.detector.borrow().needs_check() {
            self.inner.schedule();
        }
    }

    fn disconnect(&mut self) {
        self.inner.shutdown();
    }
}

impl Drop for DomFallbackDetector {
    fn drop(&mut self) {
        self.inner.shutdown();
        // Drop the JS closures so they don't leak.
        self.inner.frame.borrow_mut().take();
        self.inner.listener.borrow_mut().take();
    }
}

impl core::fmt::Debug for DomFallbackDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomFallbackDetector")
            .field("targets", &self.len())
            .field("connected", &self.inner.connected.get())
            .field("frame_pending", &self.inner.frame_id.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Live DOM geometry in viewport coordinates.
struct DomGeometry<'a> {
    root: Option<&'a Element>,
    document: Option<&'a Document>,
}

impl GeometrySource<Element> for DomGeometry<'_> {
    fn root_bounds(&self) -> Rect {
        if let Some(root) = self.root {
            return to_rect(&root.get_bounding_client_rect());
        }
        self.document
            .and_then(Document::document_element)
            .map_or(Rect::ZERO, |html| {
                Rect::new(
                    0.0,
                    0.0,
                    f64::from(html.client_width()),
                    f64::from(html.client_height()),
                )
            })
    }

    fn target_bounds(&self, target: &Element) -> Option<Rect> {
        if !target.is_connected() {
            return None;
        }
        if let Some(root) = self.root
            && !root.contains(Some(target.as_ref()))
        {
            return None;
        }
        Some(to_rect(&target.get_bounding_client_rect()))
    }
}
