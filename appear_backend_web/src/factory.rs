// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detector selection for the browser.

use alloc::rc::Rc;
use core::cell::RefCell;

use appear_core::detector::{BatchCallback, Detector, DetectorFactory, DetectorKind};
use appear_core::options::ObserverOptions;
use web_sys::Element;

use crate::fallback::DomFallbackDetector;
use crate::native::NativeDetector;
use crate::probe_capabilities;

/// A batch callback shared between a detector and its JS closures.
pub(crate) type SharedBatch = Rc<RefCell<BatchCallback<Element>>>;

/// The detector a [`WebDetectorFactory`] builds.
#[derive(Debug)]
pub enum WebDetector {
    /// Backed by `IntersectionObserver`.
    Native(NativeDetector),
    /// Backed by scroll/resize geometry checks.
    Fallback(DomFallbackDetector),
}

impl Detector for WebDetector {
    type Element = Element;

    fn observe(&mut self, element: &Element) {
        match self {
            Self::Native(d) => d.observe(element),
            Self::Fallback(d) => d.observe(element),
        }
    }

    fn disconnect(&mut self) {
        match self {
            Self::Native(d) => d.disconnect(),
            Self::Fallback(d) => d.disconnect(),
        }
    }
}

/// Builds [`WebDetector`]s of a kind chosen once, when the factory is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WebDetectorFactory {
    kind: DetectorKind,
}

impl WebDetectorFactory {
    /// Probes the browser and selects the best available detector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(DetectorKind::select(&probe_capabilities()))
    }

    /// Always builds detectors of `kind`.
    #[must_use]
    pub const fn with_kind(kind: DetectorKind) -> Self {
        Self { kind }
    }
}

impl Default for WebDetectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorFactory for WebDetectorFactory {
    type Element = Element;
    type Detector = WebDetector;

    fn kind(&self) -> DetectorKind {
        self.kind
    }

    /// A native observer that fails to construct degrades this factory to
    /// the fallback for good.
    fn create(
        &mut self,
        on_batch: BatchCallback<Element>,
        options: &ObserverOptions<Element>,
    ) -> WebDetector {
        let on_batch: SharedBatch = Rc::new(RefCell::new(on_batch));
        if self.kind == DetectorKind::Native {
            match NativeDetector::new(Rc::clone(&on_batch), options) {
                Ok(detector) => return WebDetector::Native(detector),
                Err(_) => self.kind = DetectorKind::Fallback,
            }
        }
        WebDetector::Fallback(DomFallbackDetector::new(on_batch, options))
    }
}
