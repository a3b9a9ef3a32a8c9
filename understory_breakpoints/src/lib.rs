// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_breakpoints --heading-base-level=0

//! Understory Breakpoints: ordered width tiers for responsive UI.
//!
//! This crate is the pure half of responsive layout. It knows nothing about windows,
//! elements, or change notification; it maps widths to labels and conditions to bounds.
//!
//! - [`BreakpointTable`]: an ordered list of `(label, threshold)` tiers. Two tables are
//!   built in: [`VIEWPORT_BREAKPOINTS`] over [`Breakpoint`] and [`CONTAINER_BREAKPOINTS`]
//!   over [`ContainerBreakpoint`], which adds two larger tiers.
//! - [`resolve`]: the highest tier whose threshold is at or below a width.
//! - [`Condition`]: a sparse `larger_than` / `less_than` / `only_at` range that
//!   [compiles](Condition::compile) into a [`CompiledCondition`] with a canonical
//!   descriptor string, suitable as a key for a shared query registry.
//! - [`classes`]: stateless class-name helpers for grid items, gaps, and containers.
//!
//! ## Example
//!
//! ```rust
//! use understory_breakpoints::{Breakpoint, Condition, VIEWPORT_BREAKPOINTS, resolve};
//!
//! assert_eq!(resolve(700.0, &VIEWPORT_BREAKPOINTS), Breakpoint::Sm);
//!
//! let cond = Condition::larger_than(Breakpoint::Sm)
//!     .compile(&VIEWPORT_BREAKPOINTS)
//!     .unwrap();
//! assert_eq!(cond.descriptor(), "(min-width: 640.02px)");
//! assert!(!cond.matches(640.0));
//! assert!(cond.matches(641.0));
//!
//! // A condition with no fields always holds and has nothing to subscribe to.
//! assert!(Condition::<Breakpoint>::default().compile(&VIEWPORT_BREAKPOINTS).is_none());
//! ```
//!
//! ## Boundaries
//!
//! Strict bounds and the top of an `only_at` interval sit 0.02px inside the neighboring
//! tier's threshold so adjacent intervals never both match. Widths with sub-hundredth-pixel
//! precision can land in that margin.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod classes;
mod condition;
mod labels;
mod resolve;
mod table;

pub use classes::{
    GAP_SCALE, GRID_COLUMNS, MaxWidth, ResponsiveValue, container_classes, gap_classes,
    grid_classes, grid_item_classes, prefixed,
};
pub use condition::{CompiledCondition, Condition, EPSILON_CENTI_PX};
pub use labels::{
    Breakpoint, CONTAINER_BREAKPOINTS, ContainerBreakpoint, Label, VIEWPORT_BREAKPOINTS,
};
pub use resolve::{resolve, resolve_with};
pub use table::{BreakpointTable, TableError};
