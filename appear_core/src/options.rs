// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detector configuration: root, root margin, and thresholds.
//!
//! [`ObserverOptions::default`] is the configuration a
//! [`Registry`](crate::registry::Registry) uses when it creates a detector
//! lazily: the viewport as root, a zero margin, and ten evenly spaced
//! thresholds from [`generate_threshold`].

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use kurbo::Rect;

/// Number of threshold steps in the default configuration.
pub const DEFAULT_THRESHOLD_STEPS: u32 = 10;

/// Returns `i / n` for every `i` in `0..n`.
///
/// `1.0` is never included. `generate_threshold(10)` yields
/// `[0.0, 0.1, ..., 0.9]`; `generate_threshold(0)` yields an empty list.
#[must_use]
pub fn generate_threshold(n: u32) -> Vec<f64> {
    (0..n).map(|i| f64::from(i) / f64::from(n)).collect()
}

/// Errors produced while building [`ObserverOptions`].
#[derive(Clone, Debug, PartialEq)]
pub enum OptionsError {
    /// The root margin is not one to four `px` or `%` lengths.
    InvalidRootMargin,
    /// A threshold is non-finite or outside `[0, 1]`.
    ThresholdOutOfRange(f64),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRootMargin => {
                f.write_str("root margin must be specified in pixels or percent")
            }
            Self::ThresholdOutOfRange(v) => {
                write!(f, "threshold {v} is outside the range [0, 1]")
            }
        }
    }
}

impl core::error::Error for OptionsError {}

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// Intersection ratios at which a detector reports a new measurement.
///
/// Always non-empty, sorted ascending, and free of duplicates. More steps
/// mean denser sampling during a scroll; transition decisions do not depend
/// on the step count.
#[derive(Clone, Debug, PartialEq)]
pub struct Threshold {
    values: Vec<f64>,
}

impl Threshold {
    /// Builds a threshold list. An empty input means `[0]`.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self, OptionsError> {
        let mut values = values
            .into_iter()
            .map(|v| {
                if (0.0..=1.0).contains(&v) {
                    Ok(v)
                } else {
                    Err(OptionsError::ThresholdOutOfRange(v))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        values.sort_by(f64::total_cmp);
        values.dedup();
        if values.is_empty() {
            values.push(0.0);
        }
        Ok(Self { values })
    }

    /// A single threshold.
    pub fn single(value: f64) -> Result<Self, OptionsError> {
        Self::new([value])
    }

    /// `n` evenly spaced thresholds from [`generate_threshold`].
    #[must_use]
    pub fn steps(n: u32) -> Self {
        let mut values = generate_threshold(n);
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values }
    }

    /// The threshold ratios, ascending.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::steps(DEFAULT_THRESHOLD_STEPS)
    }
}

// ---------------------------------------------------------------------------
// RootMargin
// ---------------------------------------------------------------------------

/// One side of a [`RootMargin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    /// Absolute CSS pixels.
    Px(f64),
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent(f64),
}

impl MarginLength {
    fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => extent * p / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, make): (&str, fn(f64) -> Self) = if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Self::Percent)
        } else {
            return Err(OptionsError::InvalidRootMargin);
        };
        match number.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(make(v)),
            _ => Err(OptionsError::InvalidRootMargin),
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Growth (or, with negative lengths, shrinkage) applied to the root bounds
/// before intersecting.
///
/// Parsed from CSS margin shorthand: one to four lengths in `px` or `%`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top edge.
    pub top: MarginLength,
    /// Right edge.
    pub right: MarginLength,
    /// Bottom edge.
    pub bottom: MarginLength,
    /// Left edge.
    pub left: MarginLength,
}

impl RootMargin {
    /// `0px` on every side.
    pub const ZERO: Self = Self::uniform(MarginLength::Px(0.0));

    /// The same length on every side.
    #[must_use]
    pub const fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Expands `root` by this margin.
    #[must_use]
    pub fn apply(&self, root: Rect) -> Rect {
        let w = root.width();
        let h = root.height();
        Rect::new(
            root.x0 - self.left.resolve(w),
            root.y0 - self.top.resolve(h),
            root.x1 + self.right.resolve(w),
            root.y1 + self.bottom.resolve(h),
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [MarginLength::Px(0.0); 4];
        let mut count = 0;
        for token in s.split_whitespace() {
            if count == parts.len() {
                return Err(OptionsError::InvalidRootMargin);
            }
            parts[count] = token.parse()?;
            count += 1;
        }
        let [a, b, c, d] = parts;
        match count {
            1 => Ok(Self::uniform(a)),
            2 => Ok(Self {
                top: a,
                right: b,
                bottom: a,
                left: b,
            }),
            3 => Ok(Self {
                top: a,
                right: b,
                bottom: c,
                left: b,
            }),
            4 => Ok(Self {
                top: a,
                right: b,
                bottom: c,
                left: d,
            }),
            _ => Err(OptionsError::InvalidRootMargin),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

// ---------------------------------------------------------------------------
// ObserverOptions
// ---------------------------------------------------------------------------

/// Configuration passed to a [`DetectorFactory`](crate::detector::DetectorFactory).
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions<E> {
    /// The element whose bounds act as the viewport; `None` means the
    /// top-level viewport.
    pub root: Option<E>,
    /// Margin applied to the root bounds.
    pub root_margin: RootMargin,
    /// Ratios at which measurements are reported.
    pub threshold: Threshold,
}

impl<E> ObserverOptions<E> {
    /// Parses `root_margin` and `threshold` into options for `root`.
    pub fn new(
        root: Option<E>,
        root_margin: &str,
        threshold: impl IntoIterator<Item = f64>,
    ) -> Result<Self, OptionsError> {
        Ok(Self {
            root,
            root_margin: root_margin.parse()?,
            threshold: Threshold::new(threshold)?,
        })
    }
}

impl<E> Default for ObserverOptions<E> {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: RootMargin::ZERO,
            threshold: Threshold::default(),
        }
    }
}
