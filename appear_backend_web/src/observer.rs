// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The JS-facing observer API.
//!
//! ```js
//! const appear = new AppearObserver();
//! appear.create(null, "0px 0px -20% 0px", [0, 0.5]);
//! appear.observe(document.querySelector(".card"));
//! card.addEventListener("appear", (e) => console.log(e.detail.direction));
//! card.remove();
//! appear.forget(card);
//! appear.destroy();
//! ```

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use appear_core::detector::DetectorKind;
use appear_core::options::{ObserverOptions, OptionsError, RootMargin, Threshold};
use appear_core::registry::{ObserveTarget, Registry};
use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Node};

use crate::{ConsoleSink, DomHost, WebDetectorFactory, WebRegistry};

/// `threshold` as passed from JS: absent, one ratio, or a list.
#[derive(Clone, Debug, Default, PartialEq)]
enum ThresholdInput {
    #[default]
    Default,
    Single(f64),
    List(Vec<f64>),
}

impl ThresholdInput {
    fn from_js(value: &JsValue) -> Self {
        if value.is_undefined() || value.is_null() {
            return Self::Default;
        }
        if let Some(ratio) = value.as_f64() {
            return Self::Single(ratio);
        }
        match value.dyn_ref::<Array>() {
            Some(list) => Self::List(
                list.iter()
                    .map(|v| v.as_f64().unwrap_or(f64::NAN))
                    .collect(),
            ),
            None => Self::Single(f64::NAN),
        }
    }

    fn into_threshold(self) -> Result<Threshold, OptionsError> {
        match self {
            Self::Default => Ok(Threshold::default()),
            Self::Single(ratio) => Threshold::single(ratio),
            Self::List(ratios) => Threshold::new(ratios),
        }
    }
}

fn build_options(
    root: Option<Element>,
    root_margin: Option<&str>,
    threshold: ThresholdInput,
) -> Result<ObserverOptions<Element>, OptionsError> {
    let root_margin = match root_margin {
        Some(margin) => margin.parse()?,
        None => RootMargin::ZERO,
    };
    Ok(ObserverOptions {
        root,
        root_margin,
        threshold: threshold.into_threshold()?,
    })
}

/// Observes elements and fires `appear` / `disappear` events on them.
#[wasm_bindgen]
pub struct AppearObserver {
    registry: WebRegistry,
}

#[wasm_bindgen]
impl AppearObserver {
    /// Creates an observer. No detector exists until `create` or `observe`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(WebDetectorFactory::new(), DomHost::new()),
        }
    }

    /// Creates an observer that logs detector and transition events to the
    /// console.
    ///
    /// Logging requires the `trace` feature.
    #[wasm_bindgen(js_name = withConsoleTrace)]
    pub fn with_console_trace() -> Self {
        Self {
            registry: Registry::with_sink(
                WebDetectorFactory::new(),
                DomHost::new(),
                Rc::new(RefCell::new(ConsoleSink)),
            ),
        }
    }

    /// Replaces the detector with one built from these options.
    ///
    /// `threshold` may be omitted, a single ratio, or an array of ratios.
    /// Elements observed by the previous detector must be observed again.
    pub fn create(
        &mut self,
        root: Option<Element>,
        root_margin: Option<String>,
        threshold: JsValue,
    ) -> Result<(), JsValue> {
        let options = build_options(
            root,
            root_margin.as_deref(),
            ThresholdInput::from_js(&threshold),
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.registry.create(&options);
        Ok(())
    }

    /// Starts observing an element. A document is replaced by its root
    /// element; other nodes are ignored.
    pub fn observe(&mut self, target: &Node) {
        if let Some(document) = target.dyn_ref::<Document>() {
            self.registry.observe(ObserveTarget::Document(document));
        } else if let Some(element) = target.dyn_ref::<Element>() {
            self.registry.observe(ObserveTarget::Element(element));
        }
    }

    /// Disconnects the detector. Safe to call at any time.
    pub fn destroy(&mut self) {
        self.registry.destroy();
    }

    /// Drops what is remembered about an element that has left the page.
    ///
    /// Returns `true` if the element had any recorded state.
    pub fn forget(&mut self, element: &Element) -> bool {
        self.registry.forget(element).is_some()
    }

    /// `"native"` or `"fallback"`.
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.registry.detector_kind().as_str().into()
    }

    /// Whether a detector currently exists.
    #[wasm_bindgen(getter, js_name = hasDetector)]
    pub fn has_detector(&self) -> bool {
        self.registry.has_detector()
    }
}

impl AppearObserver {
    /// Wraps a registry whose factory always builds `kind`.
    #[must_use]
    pub fn with_kind(kind: DetectorKind) -> Self {
        Self {
            registry: Registry::new(WebDetectorFactory::with_kind(kind), DomHost::new()),
        }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &WebRegistry {
        &self.registry
    }
}

impl Default for AppearObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AppearObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppearObserver")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use appear_core::options::MarginLength;

    #[test]
    fn missing_options_use_defaults() {
        let options = build_options(None, None, ThresholdInput::Default).unwrap();
        assert_eq!(options, ObserverOptions::default());
        assert_eq!(options.threshold.values().len(), 10);
    }

    #[test]
    fn single_and_list_thresholds() {
        let single = build_options(None, None, ThresholdInput::Single(0.5)).unwrap();
        assert_eq!(single.threshold.values(), &[0.5]);

        let list = build_options(None, None, ThresholdInput::List(vec![1.0, 0.0, 0.5])).unwrap();
        assert_eq!(list.threshold.values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn root_margin_is_parsed() {
        let options = build_options(None, Some("10px 5%"), ThresholdInput::Default).unwrap();
        assert_eq!(options.root_margin.top, MarginLength::Px(10.0));
        assert_eq!(options.root_margin.right, MarginLength::Percent(5.0));
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert_eq!(
            build_options(None, Some("10em"), ThresholdInput::Default),
            Err(OptionsError::InvalidRootMargin)
        );
        assert!(matches!(
            build_options(None, None, ThresholdInput::Single(1.5)),
            Err(OptionsError::ThresholdOutOfRange(_))
        ));
    }
}
