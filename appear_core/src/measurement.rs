// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection measurements delivered by a detector.

use kurbo::Rect;

/// One intersection sample for one target.
///
/// Detectors deliver these in batches (`&[Measurement<E>]`) in the order the
/// underlying mechanism produced them. The transition engine reads only
/// [`bounding_client_rect`](Self::bounding_client_rect) and
/// [`intersection_ratio`](Self::intersection_ratio).
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement<E> {
    /// The observed element.
    pub target: E,
    /// Target bounds relative to the viewport at measurement time.
    pub bounding_client_rect: Rect,
    /// Visible fraction of the target, in `[0, 1]`.
    pub intersection_ratio: f64,
    /// The visible part of the target (zero-sized when not intersecting).
    pub intersection_rect: Rect,
    /// Whether the target touches the (margin-expanded) root at all.
    pub is_intersecting: bool,
}

impl<E> Measurement<E> {
    /// Creates a measurement with only the fields the engine consumes.
    ///
    /// `intersection_rect` is left zero-sized and `is_intersecting` follows
    /// `intersection_ratio > 0`.
    #[must_use]
    pub fn new(target: E, bounding_client_rect: Rect, intersection_ratio: f64) -> Self {
        Self {
            target,
            bounding_client_rect,
            intersection_ratio,
            intersection_rect: Rect::ZERO,
            is_intersecting: intersection_ratio > 0.0,
        }
    }

    /// The target's vertical position (top edge) in viewport coordinates.
    #[inline]
    #[must_use]
    pub fn y(&self) -> f64 {
        self.bounding_client_rect.y0
    }
}
