// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breakpoint labels and the two built-in tables.

use core::fmt::Debug;

use crate::table::BreakpointTable;

/// A discrete breakpoint label that can appear in a [`BreakpointTable`].
pub trait Label: Copy + Eq + Debug + 'static {
    /// Short name used in class prefixes (for example `"sm"` or `"2xl"`).
    fn name(self) -> &'static str;
}

/// Viewport breakpoints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Breakpoint {
    /// Baseline, always active (0px).
    Xs,
    /// 640px (40rem).
    Sm,
    /// 768px (48rem).
    Md,
    /// 1024px (64rem).
    Lg,
    /// 1280px (80rem).
    Xl,
    /// 1536px (96rem).
    X2l,
    /// 1792px (112rem).
    X3l,
    /// 2048px (128rem).
    X4l,
    /// 2304px (144rem).
    X5l,
}

impl Label for Breakpoint {
    fn name(self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
            Self::X2l => "2xl",
            Self::X3l => "3xl",
            Self::X4l => "4xl",
            Self::X5l => "5xl",
        }
    }
}

/// Container breakpoints: the viewport tiers plus two larger ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerBreakpoint {
    /// Baseline, always active (0px).
    Xs,
    /// 640px.
    Sm,
    /// 768px.
    Md,
    /// 1024px.
    Lg,
    /// 1280px.
    Xl,
    /// 1536px.
    X2l,
    /// 1792px.
    X3l,
    /// 2048px.
    X4l,
    /// 2304px.
    X5l,
    /// 2560px (160rem).
    X6l,
    /// 2816px (176rem).
    X7l,
}

impl Label for ContainerBreakpoint {
    fn name(self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
            Self::X2l => "2xl",
            Self::X3l => "3xl",
            Self::X4l => "4xl",
            Self::X5l => "5xl",
            Self::X6l => "6xl",
            Self::X7l => "7xl",
        }
    }
}

/// Built-in viewport table.
pub const VIEWPORT_BREAKPOINTS: BreakpointTable<Breakpoint> = BreakpointTable::from_static(&[
    (Breakpoint::Xs, 0),
    (Breakpoint::Sm, 640),
    (Breakpoint::Md, 768),
    (Breakpoint::Lg, 1024),
    (Breakpoint::Xl, 1280),
    (Breakpoint::X2l, 1536),
    (Breakpoint::X3l, 1792),
    (Breakpoint::X4l, 2048),
    (Breakpoint::X5l, 2304),
]);

/// Built-in container table.
pub const CONTAINER_BREAKPOINTS: BreakpointTable<ContainerBreakpoint> =
    BreakpointTable::from_static(&[
        (ContainerBreakpoint::Xs, 0),
        (ContainerBreakpoint::Sm, 640),
        (ContainerBreakpoint::Md, 768),
        (ContainerBreakpoint::Lg, 1024),
        (ContainerBreakpoint::Xl, 1280),
        (ContainerBreakpoint::X2l, 1536),
        (ContainerBreakpoint::X3l, 1792),
        (ContainerBreakpoint::X4l, 2048),
        (ContainerBreakpoint::X5l, 2304),
        (ContainerBreakpoint::X6l, 2560),
        (ContainerBreakpoint::X7l, 2816),
    ]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_table_extends_viewport_table() {
        assert_eq!(VIEWPORT_BREAKPOINTS.len(), 9);
        assert_eq!(CONTAINER_BREAKPOINTS.len(), 11);
        for (&(_, v), &(_, c)) in VIEWPORT_BREAKPOINTS
            .tiers()
            .iter()
            .zip(CONTAINER_BREAKPOINTS.tiers())
        {
            assert_eq!(v, c, "shared tiers must agree");
        }
        assert_eq!(
            CONTAINER_BREAKPOINTS.threshold(ContainerBreakpoint::X7l),
            Some(2816)
        );
    }

    #[test]
    fn names_follow_class_prefixes() {
        assert_eq!(Breakpoint::X2l.name(), "2xl");
        assert_eq!(ContainerBreakpoint::X7l.name(), "7xl");
        assert_eq!(Breakpoint::Xs.name(), "xs");
    }
}
