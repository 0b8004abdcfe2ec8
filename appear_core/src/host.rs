// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract: element identity, attributes, and document roots.

use alloc::string::String;

use crate::dispatch::Dispatch;
use crate::element::{ElementId, FirePolicy, ONCE_ATTRIBUTES};

/// The element model a [`Registry`](crate::registry::Registry) runs against.
///
/// The DOM host maps `web_sys::Element` identities to [`ElementId`]s and
/// delivers `CustomEvent`s; test hosts use plain indices and record
/// notifications.
pub trait ElementHost: Dispatch {
    /// The document type, whose root element is observed in its place.
    type Document;

    /// Returns a stable id for `element`, allocating one on first sight.
    fn element_id(&mut self, element: &Self::Element) -> ElementId;

    /// Drops the id of `element` and returns it, if one was allocated.
    ///
    /// Called with a shared borrow, so it may run while a notification is
    /// being dispatched.
    fn release(&self, element: &Self::Element) -> Option<ElementId>;

    /// Reads an attribute of `element`.
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Returns the root element of `document`, if it has one.
    fn document_element(&self, document: &Self::Document) -> Option<Self::Element>;
}

/// Reads the once-flag of `element` from its attributes.
pub fn fire_policy<H: ElementHost + ?Sized>(host: &H, element: &H::Element) -> FirePolicy {
    let [isonce, data_once] = ONCE_ATTRIBUTES.map(|name| host.attribute(element, name));
    FirePolicy::from_attributes(isonce.as_deref(), data_once.as_deref())
}
