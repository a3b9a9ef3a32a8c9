// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility class-name builders for grid items, gaps, and centered containers.
//!
//! These are stateless string helpers. Invalid per-breakpoint inputs (non-finite,
//! fractional, or out of range) are skipped rather than reported.

use alloc::string::String;
use core::fmt::Write;
use smallvec::SmallVec;

use crate::labels::Breakpoint;

/// A value that is either the same at every width or set per breakpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsiveValue<T> {
    /// One value for all widths (no prefix).
    Uniform(T),
    /// Values keyed by breakpoint, emitted in the given order.
    PerBreakpoint(SmallVec<[(Breakpoint, T); 6]>),
}

/// Number of columns in the grid.
pub const GRID_COLUMNS: u8 = 12;

/// Spacing scale accepted by [`gap_classes`].
pub const GAP_SCALE: [u8; 30] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 60,
    64, 72, 80, 96,
];

fn prefix(bp: Breakpoint) -> &'static str {
    match bp {
        Breakpoint::Xs => "",
        Breakpoint::Sm => "sm:",
        Breakpoint::Md => "md:",
        Breakpoint::Lg => "lg:",
        Breakpoint::Xl => "xl:",
        Breakpoint::X2l => "2xl:",
        Breakpoint::X3l => "3xl:",
        Breakpoint::X4l => "4xl:",
        Breakpoint::X5l => "5xl:",
    }
}

fn push_class(out: &mut String, parts: &[&str]) {
    if parts.iter().all(|p| p.is_empty()) {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    for part in parts {
        out.push_str(part);
    }
}

fn column_span(value: f64) -> Option<u8> {
    (1..=GRID_COLUMNS).find(|&n| f64::from(n) == value)
}

fn basis_class(span: u8) -> &'static str {
    match span {
        1 => "basis-1/12",
        2 => "basis-2/12",
        3 => "basis-3/12",
        4 => "basis-4/12",
        5 => "basis-5/12",
        6 => "basis-6/12",
        7 => "basis-7/12",
        8 => "basis-8/12",
        9 => "basis-9/12",
        10 => "basis-10/12",
        11 => "basis-11/12",
        _ => "basis-full",
    }
}

/// Flex-basis classes for a grid item spanning `size` of [`GRID_COLUMNS`] columns.
///
/// A missing or invalid uniform size yields `basis-full`. Invalid per-breakpoint
/// entries are dropped.
///
/// ```rust
/// use smallvec::smallvec;
/// use understory_breakpoints::{Breakpoint, ResponsiveValue, grid_item_classes};
///
/// let size = ResponsiveValue::PerBreakpoint(smallvec![
///     (Breakpoint::Xs, 12.0),
///     (Breakpoint::Md, 6.0),
///     (Breakpoint::Lg, 13.0),
/// ]);
/// assert_eq!(grid_item_classes(Some(&size)), "basis-full md:basis-6/12");
/// ```
pub fn grid_item_classes(size: Option<&ResponsiveValue<f64>>) -> String {
    let mut out = String::new();
    match size {
        None => push_class(&mut out, &["basis-full"]),
        Some(ResponsiveValue::Uniform(v)) => {
            let class = column_span(*v).map_or("basis-full", basis_class);
            push_class(&mut out, &[class]);
        }
        Some(ResponsiveValue::PerBreakpoint(values)) => {
            for &(bp, v) in values {
                if let Some(span) = column_span(v) {
                    push_class(&mut out, &[prefix(bp), basis_class(span)]);
                }
            }
        }
    }
    out
}

/// Classes for a grid: `flex flex-wrap` for containers, basis classes for items,
/// followed by `extra`.
pub fn grid_classes(container: bool, size: Option<&ResponsiveValue<f64>>, extra: &str) -> String {
    let mut out = if container {
        String::from("flex flex-wrap")
    } else {
        grid_item_classes(size)
    };
    push_class(&mut out, &[extra.trim()]);
    out
}

/// `gap-N` classes over [`GAP_SCALE`]. Values off the scale are dropped.
pub fn gap_classes(gap: &ResponsiveValue<f64>) -> String {
    let mut out = String::new();
    let mut emit = |bp: Breakpoint, v: f64| {
        if let Some(&step) = GAP_SCALE.iter().find(|&&s| f64::from(s) == v) {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}gap-{step}", prefix(bp));
        }
    };
    match gap {
        ResponsiveValue::Uniform(v) => emit(Breakpoint::Xs, *v),
        ResponsiveValue::PerBreakpoint(values) => {
            for &(bp, v) in values {
                emit(bp, v);
            }
        }
    }
    out
}

/// Maximum width of a centered container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaxWidth {
    /// `max-w-sm`
    Sm,
    /// `max-w-md`
    Md,
    /// `max-w-lg`
    #[default]
    Lg,
    /// `max-w-xl`
    Xl,
    /// `max-w-2xl`
    X2l,
    /// `max-w-3xl`
    X3l,
    /// `max-w-4xl`
    X4l,
    /// `max-w-5xl`
    X5l,
    /// `max-w-6xl`
    X6l,
    /// `max-w-7xl`
    X7l,
    /// 1600px.
    X8l,
    /// 1800px.
    X9l,
    /// `max-w-full`
    Full,
}

impl MaxWidth {
    /// The utility class for this width.
    pub fn class(self) -> &'static str {
        match self {
            Self::Sm => "max-w-sm",
            Self::Md => "max-w-md",
            Self::Lg => "max-w-lg",
            Self::Xl => "max-w-xl",
            Self::X2l => "max-w-2xl",
            Self::X3l => "max-w-3xl",
            Self::X4l => "max-w-4xl",
            Self::X5l => "max-w-5xl",
            Self::X6l => "max-w-6xl",
            Self::X7l => "max-w-7xl",
            Self::X8l => "max-w-[1600px]",
            Self::X9l => "max-w-[1800px]",
            Self::Full => "max-w-full",
        }
    }
}

/// Classes for a horizontally centered, padded container.
pub fn container_classes(max_width: MaxWidth, extra: &str) -> String {
    let mut out = String::from("container mx-auto px-2");
    push_class(&mut out, &[max_width.class()]);
    push_class(&mut out, &[extra.trim()]);
    out
}

/// Breakpoint-prefixed class, e.g. `md:hidden`. The baseline tier has no prefix.
pub fn prefixed(bp: Breakpoint, class: &str) -> String {
    let mut out = String::from(prefix(bp));
    out.push_str(class);
    out
}
