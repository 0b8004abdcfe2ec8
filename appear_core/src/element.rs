// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identity, per-element visibility state, and the once-flag.

use core::fmt;

/// Attributes that mark an element as firing at most once per transition type.
pub const ONCE_ATTRIBUTES: [&str; 2] = ["isonce", "data-once"];

/// An opaque handle identifying an observed element.
///
/// Hosts assign these (see [`ElementHost::element_id`]); core code keys its
/// state table by them without interpreting the value.
///
/// [`ElementHost::element_id`]: crate::host::ElementHost::element_id
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ElementId(pub u32);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// Visibility state tracked for one element.
///
/// Only the [`TransitionEngine`](crate::engine::TransitionEngine) mutates
/// this. `has_appeared` and `has_disappeared` never revert once set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementState {
    appeared: bool,
    has_appeared: bool,
    has_disappeared: bool,
    before_y: Option<f64>,
}

impl ElementState {
    /// Whether the element is currently considered visible.
    #[inline]
    #[must_use]
    pub const fn appeared(&self) -> bool {
        self.appeared
    }

    /// Whether an `appear` has ever fired for this element.
    #[inline]
    #[must_use]
    pub const fn has_appeared(&self) -> bool {
        self.has_appeared
    }

    /// Whether a `disappear` has ever fired for this element.
    #[inline]
    #[must_use]
    pub const fn has_disappeared(&self) -> bool {
        self.has_disappeared
    }

    /// The vertical position recorded at the previous measurement.
    #[inline]
    #[must_use]
    pub const fn before_y(&self) -> Option<f64> {
        self.before_y
    }

    pub(crate) fn mark_appeared(&mut self) {
        self.appeared = true;
        self.has_appeared = true;
    }

    pub(crate) fn mark_disappeared(&mut self) {
        self.appeared = false;
        self.has_disappeared = true;
    }

    /// Non-finite positions are recorded as absent.
    pub(crate) fn record_y(&mut self, y: f64) {
        self.before_y = y.is_finite().then_some(y);
    }
}

/// Whether an element may fire the same transition type more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FirePolicy {
    /// Fire on every qualifying transition.
    #[default]
    Repeat,
    /// Fire each transition type at most once.
    Once,
}

impl FirePolicy {
    /// Builds the policy from the raw values of the [`ONCE_ATTRIBUTES`].
    ///
    /// Either attribute being truthy makes the element [`Once`](Self::Once).
    #[must_use]
    pub fn from_attributes(isonce: Option<&str>, data_once: Option<&str>) -> Self {
        if is_truthy(isonce) || is_truthy(data_once) {
            Self::Once
        } else {
            Self::Repeat
        }
    }

    /// Returns `true` for [`Once`](Self::Once).
    #[inline]
    #[must_use]
    pub const fn is_once(self) -> bool {
        matches!(self, Self::Once)
    }
}

/// Attribute truthiness: present, non-empty, and not the literal `"false"`.
#[must_use]
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "false")
}
