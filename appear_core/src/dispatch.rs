// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition notifications and the delivery seam.

use crate::engine::{Direction, Transition, TransitionKind};

/// A typed `appear` / `disappear` notification for one element.
///
/// Notifications never bubble to ancestors and are always cancelable; the
/// only payload is the scroll [`Direction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Notification {
    /// Appear or disappear.
    pub kind: TransitionKind,
    /// Scroll direction payload.
    pub direction: Direction,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub const fn new(kind: TransitionKind, direction: Direction) -> Self {
        Self { kind, direction }
    }

    /// Event name: `"appear"` or `"disappear"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Always `false`: parents never observe the notification.
    #[must_use]
    pub const fn bubbles(&self) -> bool {
        false
    }

    /// Always `true`: handlers may cancel default follow-on behavior.
    #[must_use]
    pub const fn cancelable(&self) -> bool {
        true
    }
}

impl From<Transition> for Notification {
    fn from(t: Transition) -> Self {
        Self::new(t.kind, t.direction)
    }
}

/// Delivers notifications to elements.
///
/// Delivery is synchronous. Implementations do not report a result to the
/// engine, and a panicking handler is not caught here.
pub trait Dispatch {
    /// Element type notifications are delivered to.
    type Element;

    /// Delivers `notification` to `target`.
    fn dispatch(&self, target: &Self::Element, notification: &Notification);
}
