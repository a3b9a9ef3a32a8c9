// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Width → label resolution.

use crate::table::BreakpointTable;

/// Resolve `width` to the highest tier whose threshold is `<= width`.
///
/// The scan is ascending and stops at the first tier above `width`, so it is a single
/// pass over the table. Widths of `0`, negative widths, and NaN resolve to the first
/// tier.
///
/// ```rust
/// use understory_breakpoints::{Breakpoint, VIEWPORT_BREAKPOINTS, resolve};
///
/// assert_eq!(resolve(700.0, &VIEWPORT_BREAKPOINTS), Breakpoint::Sm);
/// assert_eq!(resolve(768.0, &VIEWPORT_BREAKPOINTS), Breakpoint::Md);
/// assert_eq!(resolve(0.0, &VIEWPORT_BREAKPOINTS), Breakpoint::Xs);
/// ```
pub fn resolve<L: Copy + PartialEq + 'static>(width: f64, table: &BreakpointTable<L>) -> L {
    resolve_with(table, |threshold| width >= f64::from(threshold))
}

/// Same scan as [`resolve`], driven by an "is the width at least `threshold`" predicate.
///
/// Useful when the caller cannot read a width directly and only observes one
/// `min-width` predicate per tier. The first tier is never queried.
pub fn resolve_with<L, F>(table: &BreakpointTable<L>, mut at_least: F) -> L
where
    L: Copy + PartialEq + 'static,
    F: FnMut(u32) -> bool,
{
    let mut active = table.first();
    for &(label, threshold) in &table.tiers()[1..] {
        if at_least(threshold) {
            active = label;
        } else {
            break;
        }
    }
    active
}
