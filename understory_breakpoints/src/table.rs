// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered `(label, threshold)` tables.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

/// An ordered sequence of `(label, threshold)` tiers, thresholds in pixels.
///
/// Invariants:
/// - the table is not empty,
/// - the first tier has threshold `0` (it is active at width `0`),
/// - thresholds are strictly increasing.
///
/// Built-in tables are validated at compile time through [`BreakpointTable::from_static`].
/// Tables assembled at runtime go through [`BreakpointTable::new`], which reports violations
/// as a [`TableError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreakpointTable<L: Clone + 'static> {
    tiers: Cow<'static, [(L, u32)]>,
}

/// Reasons a runtime table was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TableError {
    /// The table has no tiers.
    Empty,
    /// The first tier does not start at `0`.
    NonZeroBase,
    /// The threshold at `index` is not greater than the one before it.
    NotIncreasing {
        /// Position of the offending tier.
        index: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("breakpoint table is empty"),
            Self::NonZeroBase => f.write_str("first breakpoint threshold must be 0"),
            Self::NotIncreasing { index } => {
                write!(f, "breakpoint threshold at index {index} is not increasing")
            }
        }
    }
}

impl core::error::Error for TableError {}

const fn check(thresholds: &[u32]) -> Result<(), TableError> {
    if thresholds.is_empty() {
        return Err(TableError::Empty);
    }
    if thresholds[0] != 0 {
        return Err(TableError::NonZeroBase);
    }
    let mut i = 1;
    while i < thresholds.len() {
        if thresholds[i] <= thresholds[i - 1] {
            return Err(TableError::NotIncreasing { index: i });
        }
        i += 1;
    }
    Ok(())
}

impl<L: Copy + PartialEq + 'static> BreakpointTable<L> {
    /// Wrap a static tier list.
    ///
    /// Panics (at compile time when used in a `const`) if the invariants do not hold.
    pub const fn from_static(tiers: &'static [(L, u32)]) -> Self {
        assert!(!tiers.is_empty(), "breakpoint table is empty");
        assert!(tiers[0].1 == 0, "first breakpoint threshold must be 0");
        let mut i = 1;
        while i < tiers.len() {
            assert!(
                tiers[i].1 > tiers[i - 1].1,
                "breakpoint thresholds must be strictly increasing"
            );
            i += 1;
        }
        Self {
            tiers: Cow::Borrowed(tiers),
        }
    }

    /// Build a table at runtime, validating the invariants.
    pub fn new(tiers: Vec<(L, u32)>) -> Result<Self, TableError> {
        let thresholds: Vec<u32> = tiers.iter().map(|&(_, t)| t).collect();
        check(&thresholds)?;
        Ok(Self {
            tiers: Cow::Owned(tiers),
        })
    }

    /// All tiers in ascending threshold order.
    pub fn tiers(&self) -> &[(L, u32)] {
        &self.tiers
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always `false`; tables have at least one tier.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The lowest tier's label, active at width `0`.
    pub fn first(&self) -> L {
        self.tiers[0].0
    }

    /// Position of `label` in the table.
    pub fn position(&self, label: L) -> Option<usize> {
        self.tiers.iter().position(|&(l, _)| l == label)
    }

    /// Threshold of `label`, or `None` if the table does not contain it.
    pub fn threshold(&self, label: L) -> Option<u32> {
        self.tiers
            .iter()
            .find_map(|&(l, t)| (l == label).then_some(t))
    }

    /// The tier immediately after `label`.
    pub fn next(&self, label: L) -> Option<(L, u32)> {
        let pos = self.position(label)?;
        self.tiers.get(pos + 1).copied()
    }

    /// The tier immediately before `label`.
    pub fn previous(&self, label: L) -> Option<(L, u32)> {
        let pos = self.position(label)?;
        pos.checked_sub(1).and_then(|p| self.tiers.get(p).copied())
    }
}
