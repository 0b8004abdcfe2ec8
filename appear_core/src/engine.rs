// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Appear/disappear decisions over intersection measurements.
//!
//! [`TransitionEngine::evaluate`] is called once per measurement, in
//! delivery order. It reads and writes only the [`ElementState`] of that
//! measurement's element:
//!
//! 1. `before_y` is the previous position truncated to a whole pixel. It
//!    defaults to the current `y` when nothing is recorded or the truncated
//!    value is zero, so a first sample has no direction bias.
//! 2. **Appear** when `ratio > 0.01`, the element is not currently appeared,
//!    and it is not a once element that has already appeared.
//! 3. Otherwise **disappear** when `ratio == 0` exactly, the element is
//!    currently appeared, and it is not a once element that has already
//!    disappeared.
//! 4. The current `y` is recorded unconditionally.
//!
//! The appear floor ignores sliver intersections near zero, while disappear
//! waits for the element to be fully out of view. Direction compares the
//! vertical position against the previous sample: a larger `y` means the
//! content moved down the screen, which is [`Direction::Up`] scrolling. Ties
//! resolve to [`Direction::Down`].

use hashbrown::HashMap;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::element::{ElementId, ElementState, FirePolicy};
use crate::trace::{SuppressedEvent, Tracer, TransitionEvent};

/// Intersection ratio an element must exceed to appear.
pub const APPEAR_RATIO: f64 = 0.01;

/// Which way the page was scrolling when a transition fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The element moved down the viewport since the previous sample.
    Up,
    /// The element moved up the viewport, or did not move.
    Down,
}

impl Direction {
    /// Compares the current vertical position against the previous one.
    #[inline]
    #[must_use]
    pub fn between(before_y: f64, current_y: f64) -> Self {
        if current_y > before_y {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// The payload value carried by notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// The two transition types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// The element entered the viewport.
    Appear,
    /// The element left the viewport entirely.
    Disappear,
}

impl TransitionKind {
    /// The notification name for this transition.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Appear => "appear",
            Self::Disappear => "disappear",
        }
    }
}

/// A decided transition for one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    /// The element that transitioned.
    pub element: ElementId,
    /// Appear or disappear.
    pub kind: TransitionKind,
    /// Scroll direction at the time of the transition.
    pub direction: Direction,
}

/// Whole-pixel previous position. Zero counts as unknown.
fn previous_y(recorded: Option<f64>) -> Option<f64> {
    recorded.map(f64::trunc).filter(|y| *y != 0.0)
}

/// Per-element visibility state and the transition rules.
///
/// State is created on the first measurement for an element and kept until
/// [`forget`](Self::forget) or [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct TransitionEngine {
    states: HashMap<ElementId, ElementState>,
}

impl TransitionEngine {
    /// Creates an engine with no recorded elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state recorded for `element`, if any measurement has been
    /// evaluated for it.
    #[must_use]
    pub fn state(&self, element: ElementId) -> Option<&ElementState> {
        self.states.get(&element)
    }

    /// Number of elements with recorded state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no element has recorded state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drops the state of an element the host knows is gone.
    pub fn forget(&mut self, element: ElementId) -> Option<ElementState> {
        self.states.remove(&element)
    }

    /// Drops every element's state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Evaluates one measurement and returns the transition it triggers.
    ///
    /// `policy` is read by the caller from the element's attributes for every
    /// measurement, so a change takes effect on the next sample.
    pub fn evaluate(
        &mut self,
        element: ElementId,
        y: f64,
        ratio: f64,
        policy: FirePolicy,
        tracer: &mut Tracer<'_>,
    ) -> Option<Transition> {
        let state = self.states.entry(element).or_default();
        let before_y = previous_y(state.before_y()).unwrap_or(y);
        let direction = Direction::between(before_y, y);
        let once = policy.is_once();

        let mut fired = None;
        if ratio > APPEAR_RATIO && !state.appeared() {
            if once && state.has_appeared() {
                tracer.suppressed(&SuppressedEvent {
                    element,
                    kind: TransitionKind::Appear,
                    ratio,
                });
            } else {
                state.mark_appeared();
                fired = Some(TransitionKind::Appear);
            }
        } else if ratio == 0.0 && state.appeared() {
            if once && state.has_disappeared() {
                tracer.suppressed(&SuppressedEvent {
                    element,
                    kind: TransitionKind::Disappear,
                    ratio,
                });
            } else {
                state.mark_disappeared();
                fired = Some(TransitionKind::Disappear);
            }
        }

        state.record_y(y);

        let kind = fired?;
        tracer.transition(&TransitionEvent {
            element,
            kind,
            direction,
            ratio,
            y,
        });
        Some(Transition {
            element,
            kind,
            direction,
        })
    }
}
