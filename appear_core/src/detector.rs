// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detector contract and implementation selection.
//!
//! A *detector* is the viewport-intersection mechanism: it watches targets
//! and, on its own host-controlled schedule, calls a [`BatchCallback`] with
//! measurement batches. Two kinds exist:
//!
//! - **Native**: the host's own mechanism (`IntersectionObserver` in a
//!   browser).
//! - **Fallback**: [`FallbackDetector`](crate::fallback::FallbackDetector)
//!   driven by host geometry, for hosts without a usable native mechanism.
//!
//! Backends probe the host once, at composition time, into [`Capabilities`]
//! and pick a kind with [`DetectorKind::select`]. The choice is fixed for the
//! lifetime of the factory.

use alloc::boxed::Box;

use crate::measurement::Measurement;
use crate::options::ObserverOptions;

/// Receives each measurement batch a detector delivers.
pub type BatchCallback<E> = Box<dyn FnMut(&[Measurement<E>])>;

/// A running viewport-intersection mechanism.
pub trait Detector {
    /// The observable element type.
    type Element;

    /// Starts watching `element`. Observing the same element twice has no
    /// further effect.
    fn observe(&mut self, element: &Self::Element);

    /// Stops all measurement delivery and forgets every observed element.
    fn disconnect(&mut self);
}

/// Builds detectors wired to a batch callback.
///
/// [`Registry`](crate::registry::Registry) calls [`create`](Self::create) on
/// first use and on every explicit `create`.
pub trait DetectorFactory {
    /// The observable element type.
    type Element;
    /// The detector this factory builds.
    type Detector: Detector<Element = Self::Element>;

    /// Which implementation [`create`](Self::create) produces.
    fn kind(&self) -> DetectorKind;

    /// Builds a detector that delivers batches to `on_batch`.
    fn create(
        &mut self,
        on_batch: BatchCallback<Self::Element>,
        options: &ObserverOptions<Self::Element>,
    ) -> Self::Detector;
}

/// Host features relevant to choosing a detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// The native observer constructor exists.
    pub intersection_observer: bool,
    /// The native measurement entry type exists.
    pub intersection_observer_entry: bool,
    /// Native entries expose an intersection ratio.
    pub entry_intersection_ratio: bool,
}

impl Capabilities {
    /// A host with a fully usable native mechanism.
    pub const NATIVE: Self = Self {
        intersection_observer: true,
        intersection_observer_entry: true,
        entry_intersection_ratio: true,
    };
}

/// Which detector implementation is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// The host's native mechanism.
    Native,
    /// The geometry-driven fallback.
    Fallback,
}

impl DetectorKind {
    /// Prefers [`Native`](Self::Native) when the host provides the observer,
    /// its entry type, and the entry's intersection ratio.
    #[must_use]
    pub const fn select(caps: &Capabilities) -> Self {
        if caps.intersection_observer
            && caps.intersection_observer_entry
            && caps.entry_intersection_ratio
        {
            Self::Native
        } else {
            Self::Fallback
        }
    }

    /// Short label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Fallback => "fallback",
        }
    }
}
