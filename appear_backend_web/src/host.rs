// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM element host.

use alloc::string::String;

use appear_core::dispatch::{Dispatch, Notification};
use appear_core::element::ElementId;
use appear_core::host::ElementHost;
use js_sys::{Object, Reflect, WeakMap};
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit, Document, Element};

/// Maps DOM elements to [`ElementId`]s and delivers notifications as
/// `CustomEvent`s.
///
/// Ids live in a `WeakMap`, so tracking an element never keeps it alive.
pub struct DomHost {
    ids: WeakMap,
    next: u32,
}

impl DomHost {
    /// Creates a host with no known elements.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: WeakMap::new(),
            next: 0,
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "only u32 ids are ever stored in the map"
    )]
    fn lookup(&self, element: &Element) -> Option<ElementId> {
        let key: &Object = element.as_ref();
        let id = self.ids.get(key).as_f64()?;
        Some(ElementId(id as u32))
    }
}

impl Default for DomHost {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("ids", &"WeakMap")
            .field("next", &self.next)
            .finish()
    }
}

impl Dispatch for DomHost {
    type Element = Element;

    fn dispatch(&self, target: &Element, notification: &Notification) {
        let detail = Object::new();
        let _ = Reflect::set(
            &detail,
            &JsValue::from_str("direction"),
            &JsValue::from_str(notification.direction.as_str()),
        );

        let init = CustomEventInit::new();
        init.set_bubbles(notification.bubbles());
        init.set_cancelable(notification.cancelable());
        init.set_detail(&detail);

        if let Ok(event) = CustomEvent::new_with_event_init_dict(notification.name(), &init) {
            let _ = target.dispatch_event(&event);
        }
    }
}

impl ElementHost for DomHost {
    type Document = Document;

    fn element_id(&mut self, element: &Element) -> ElementId {
        if let Some(id) = self.lookup(element) {
            return id;
        }
        let key: &Object = element.as_ref();
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        self.ids.set(key, &JsValue::from(id));
        ElementId(id)
    }

    fn release(&self, element: &Element) -> Option<ElementId> {
        let id = self.lookup(element)?;
        let key: &Object = element.as_ref();
        self.ids.delete(key);
        Some(id)
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn document_element(&self, document: &Document) -> Option<Element> {
        document.document_element()
    }
}
