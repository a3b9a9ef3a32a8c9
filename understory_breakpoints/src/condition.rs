// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Range conditions (`larger_than` / `less_than` / `only_at`) and their compiled form.
//!
//! A [`Condition`] is compiled against a [`BreakpointTable`] into a [`CompiledCondition`]:
//! an optional lower and an optional upper width bound. The compiled form renders as a
//! canonical media-query-like descriptor, so two conditions with the same resolved bounds
//! always produce the same string and share one registry entry.
//!
//! Strict comparisons and the `only_at` upper edge are expressed with a fixed sub-pixel
//! margin of [`EPSILON_CENTI_PX`] hundredths of a pixel (0.02px). This is an approximation:
//! layouts measured at sub-hundredth-pixel precision may fall into the margin and match
//! neither side of a boundary.

use alloc::string::{String, ToString};
use core::fmt;

use crate::table::BreakpointTable;

/// Sub-pixel margin, in hundredths of a pixel, applied to strict and `only_at` bounds.
pub const EPSILON_CENTI_PX: i64 = 2;

/// A sparse range condition over a breakpoint table.
///
/// When `only_at` is set, `larger_than` and `less_than` are ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Condition<L> {
    /// Width strictly greater than this tier's threshold.
    pub larger_than: Option<L>,
    /// Width strictly less than this tier's threshold.
    pub less_than: Option<L>,
    /// Width within this tier: from its threshold up to (not including) the next tier.
    pub only_at: Option<L>,
}

impl<L> Default for Condition<L> {
    fn default() -> Self {
        Self {
            larger_than: None,
            less_than: None,
            only_at: None,
        }
    }
}

impl<L> Condition<L> {
    /// `width > threshold(label)`.
    pub const fn larger_than(label: L) -> Self {
        Self {
            larger_than: Some(label),
            less_than: None,
            only_at: None,
        }
    }

    /// `width < threshold(label)`.
    pub const fn less_than(label: L) -> Self {
        Self {
            larger_than: None,
            less_than: Some(label),
            only_at: None,
        }
    }

    /// `threshold(label) <= width < threshold(next(label))`.
    pub const fn only_at(label: L) -> Self {
        Self {
            larger_than: None,
            less_than: None,
            only_at: Some(label),
        }
    }

    /// Add an upper bound to this condition.
    #[must_use]
    pub fn and_less_than(mut self, label: L) -> Self {
        self.less_than = Some(label);
        self
    }

    /// Returns `true` if no field is set; such a condition always holds.
    pub const fn is_vacuous(&self) -> bool {
        self.larger_than.is_none() && self.less_than.is_none() && self.only_at.is_none()
    }
}

impl<L: Copy + PartialEq + 'static> Condition<L> {
    /// Compile into width bounds.
    ///
    /// Returns `None` for a vacuous condition. Callers must treat that as "always true"
    /// and not subscribe to anything.
    ///
    /// If any label the condition uses is missing from `table`, the result is
    /// [`CompiledCondition::NEVER`], which matches no width and renders as `not all`.
    pub fn compile(&self, table: &BreakpointTable<L>) -> Option<CompiledCondition> {
        if self.is_vacuous() {
            return None;
        }
        let known = |l: Option<L>| l.is_none_or(|l| table.threshold(l).is_some());
        let used_known = match self.only_at {
            Some(label) => known(Some(label)),
            None => known(self.larger_than) && known(self.less_than),
        };
        if !used_known {
            return Some(CompiledCondition::NEVER);
        }
        let centi = |t: u32| i64::from(t) * 100;
        let compiled = if let Some(label) = self.only_at {
            CompiledCondition {
                min: table.threshold(label).map(centi),
                max: table
                    .next(label)
                    .map(|(_, t)| centi(t) - EPSILON_CENTI_PX),
            }
        } else {
            CompiledCondition {
                min: self
                    .larger_than
                    .and_then(|l| table.threshold(l))
                    .map(|t| centi(t) + EPSILON_CENTI_PX),
                max: self
                    .less_than
                    .and_then(|l| table.threshold(l))
                    .map(|t| centi(t) - EPSILON_CENTI_PX),
            }
        };
        Some(compiled)
    }
}

/// Inclusive width bounds, stored in hundredths of a pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompiledCondition {
    min: Option<i64>,
    max: Option<i64>,
}

impl CompiledCondition {
    /// Matches no width.
    pub const NEVER: Self = Self {
        min: Some(1),
        max: Some(0),
    };

    /// `width >= threshold`, the plain per-tier query.
    pub fn at_least(threshold: u32) -> Self {
        Self {
            min: Some(i64::from(threshold) * 100),
            max: None,
        }
    }

    /// Lower bound in pixels.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Bounds are small hundredth-pixel integers and convert exactly."
    )]
    pub fn min_width(&self) -> Option<f64> {
        self.min.map(|c| c as f64 / 100.0)
    }

    /// Upper bound in pixels.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Bounds are small hundredth-pixel integers and convert exactly."
    )]
    pub fn max_width(&self) -> Option<f64> {
        self.max.map(|c| c as f64 / 100.0)
    }

    /// Evaluate the bounds against a width, inclusive on both ends.
    pub fn matches(&self, width: f64) -> bool {
        self.min_width().is_none_or(|min| width >= min)
            && self.max_width().is_none_or(|max| width <= max)
    }

    /// The canonical descriptor string, e.g. `(min-width: 640.02px)`.
    pub fn descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CompiledCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NEVER {
            return f.write_str("not all");
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                write!(f, "(min-width: {}) and (max-width: {})", Px(min), Px(max))
            }
            (Some(min), None) => write!(f, "(min-width: {})", Px(min)),
            (None, Some(max)) => write!(f, "(max-width: {})", Px(max)),
            (None, None) => f.write_str("all"),
        }
    }
}

/// Hundredths of a pixel, printed without trailing zeros.
struct Px(i64);

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (whole, frac) = (abs / 100, abs % 100);
        if frac == 0 {
            write!(f, "{sign}{whole}px")
        } else if frac % 10 == 0 {
            write!(f, "{sign}{whole}.{}px", frac / 10)
        } else {
            write!(f, "{sign}{whole}.{frac:02}px")
        }
    }
}
