// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry-driven detector for hosts without a native intersection observer.
//!
//! [`FallbackDetector`] holds the observed targets and the last sample for
//! each. The host decides *when* to measure (scroll, resize, an animation
//! frame, or an explicit flush in tests) and calls
//! [`check`](FallbackDetector::check) with a [`GeometrySource`]; the detector
//! decides *what* to report:
//!
//! - every target's first check is always reported;
//! - afterwards a target is reported only when its ratio crosses one of the
//!   configured thresholds, or when it starts or stops intersecting.
//!
//! Targets only need rectangles. Ancestor clipping, transforms, and
//! occlusion are out of scope; the host supplies target bounds already in
//! root-relative coordinates.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::detector::Detector;
use crate::measurement::Measurement;
use crate::options::{ObserverOptions, RootMargin, Threshold};

/// Supplies the rectangles a [`FallbackDetector`] measures against.
pub trait GeometrySource<E> {
    /// Bounds of the root (the viewport, or the configured root element),
    /// before the root margin is applied.
    fn root_bounds(&self) -> Rect;

    /// Bounds of `target` in the same coordinate space as
    /// [`root_bounds`](Self::root_bounds).
    ///
    /// `None` means the target is not rendered or is not inside the root; it
    /// is then reported as not intersecting.
    fn target_bounds(&self, target: &E) -> Option<Rect>;
}

/// Intersection of two rectangles, or `None` if they are disjoint.
///
/// Rectangles that only share an edge intersect with a zero-area result.
#[must_use]
pub fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    (x1 >= x0 && y1 >= y0).then(|| Rect::new(x0, y0, x1, y1))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sample {
    ratio: f64,
    intersecting: bool,
}

impl Sample {
    /// Non-intersecting samples compare as `-1` so that leaving the root is
    /// always a crossing.
    fn effective_ratio(self) -> f64 {
        if self.intersecting { self.ratio } else { -1.0 }
    }
}

#[derive(Clone, Debug)]
struct Tracked<E> {
    target: E,
    last: Option<Sample>,
}

/// A detector that computes intersections from host-supplied rectangles.
#[derive(Clone, Debug)]
pub struct FallbackDetector<E> {
    targets: Vec<Tracked<E>>,
    root_margin: RootMargin,
    threshold: Threshold,
    pending: bool,
}

impl<E: Clone + PartialEq> FallbackDetector<E> {
    /// Creates a detector with the margin and thresholds of `options`.
    ///
    /// `options.root` is not stored: the [`GeometrySource`] passed to
    /// [`check`](Self::check) decides what the root bounds are.
    #[must_use]
    pub fn new(options: &ObserverOptions<E>) -> Self {
        Self {
            targets: Vec::new(),
            root_margin: options.root_margin,
            threshold: options.threshold.clone(),
            pending: false,
        }
    }

    /// Number of observed targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if nothing is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns `true` if a target was added since the last check.
    #[must_use]
    pub fn needs_check(&self) -> bool {
        self.pending
    }

    /// Measures every target and returns the measurements worth reporting.
    pub fn check<G>(&mut self, geometry: &G) -> Vec<Measurement<E>>
    where
        G: GeometrySource<E> + ?Sized,
    {
        self.pending = false;
        let root = self.root_margin.apply(geometry.root_bounds());
        let thresholds = self.threshold.values();

        let mut out = Vec::new();
        for tracked in &mut self.targets {
            let bounds = geometry.target_bounds(&tracked.target);
            let hit = bounds.and_then(|b| intersect(b, root));
            let bounding_client_rect = bounds.unwrap_or(Rect::ZERO);
            let target_area = bounding_client_rect.area();
            let ratio = match hit {
                Some(r) if target_area > 0.0 => (r.area() / target_area).clamp(0.0, 1.0),
                Some(_) => 1.0,
                None => 0.0,
            };
            let sample = Sample {
                ratio,
                intersecting: hit.is_some(),
            };

            let report = match tracked.last {
                None => true,
                Some(last) => crossed(last, sample, thresholds),
            };
            tracked.last = Some(sample);

            if report {
                out.push(Measurement {
                    target: tracked.target.clone(),
                    bounding_client_rect,
                    intersection_ratio: ratio,
                    intersection_rect: hit.unwrap_or(Rect::ZERO),
                    is_intersecting: sample.intersecting,
                });
            }
        }
        out
    }
}

impl<E: Clone + PartialEq> Detector for FallbackDetector<E> {
    type Element = E;

    fn observe(&mut self, element: &E) {
        if self.targets.iter().any(|t| t.target == *element) {
            return;
        }
        self.targets.push(Tracked {
            target: element.clone(),
            last: None,
        });
        self.pending = true;
    }

    fn disconnect(&mut self) {
        self.targets.clear();
        self.pending = false;
    }
}

/// Whether moving from `old` to `new` crosses any threshold.
fn crossed(old: Sample, new: Sample, thresholds: &[f64]) -> bool {
    let old = old.effective_ratio();
    let new = new.effective_ratio();
    if old == new {
        return false;
    }
    thresholds
        .iter()
        .any(|&t| t == old || t == new || (t < old) != (t < new))
}
