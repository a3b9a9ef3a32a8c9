// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_responsive --heading-base-level=0

//! Understory Responsive: reactive breakpoint stores.
//!
//! This crate joins the pure tier logic of `understory_breakpoints` with the shared
//! registries of `understory_observe`. Each store implements [`ExternalStore`]: read
//! [`snapshot`](ExternalStore::snapshot) when rendering, and re-read it whenever the
//! listener passed to [`subscribe`](ExternalStore::subscribe) fires.
//!
//! Viewport stores, over a [`QueryRegistry`]:
//!
//! - [`viewport_breakpoint`] / [`viewport_container_breakpoint`]: the active tier of the
//!   viewport, using one `(min-width: Npx)` query per tier.
//! - [`viewport_condition`] / [`viewport_container_condition`]: whether a
//!   [`Condition`] holds, compiled into a single query.
//!
//! Element stores, over a [`SizeRegistry`]:
//!
//! - [`element_breakpoint`]: the container tier of one element's own width.
//! - [`element_condition`]: whether that width satisfies a [`Condition`].
//!
//! Stores are cheap to create. However many of them watch the same tier, descriptor, or
//! element, the registries hold a single native listener or observation for it.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use understory_breakpoints::{Breakpoint, Condition};
//! use understory_observe::mock::MockViewport;
//! use understory_observe::{ExternalStore, QueryRegistry};
//! use understory_responsive::{viewport_breakpoint, viewport_condition};
//!
//! let viewport = MockViewport::new(900.0);
//! let registry = QueryRegistry::new(viewport.clone());
//!
//! let bp = viewport_breakpoint(&registry);
//! let wide = viewport_condition(&registry, &Condition::larger_than(Breakpoint::Md));
//! let _sub = bp.subscribe(Rc::new(|| {}));
//!
//! assert_eq!(bp.snapshot(), Breakpoint::Md);
//! assert!(wide.snapshot());
//!
//! viewport.set_width(768.0);
//! assert_eq!(bp.snapshot(), Breakpoint::Md);
//! assert!(!wide.snapshot());
//!
//! // Without an interactive host, stores report their server values.
//! assert_eq!(bp.server_snapshot(), Breakpoint::Xs);
//! assert!(!wide.server_snapshot());
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support in `understory_observe` and its dependencies.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//! - `tracing`: forwards to `understory_observe/tracing`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod element;
mod viewport;

pub use element::{ElementBreakpoint, ElementCondition, element_breakpoint, element_condition};
pub use viewport::{
    ViewportBreakpoint, ViewportCondition, viewport_breakpoint, viewport_condition,
    viewport_container_breakpoint, viewport_container_condition,
};

pub use understory_breakpoints::Condition;
pub use understory_observe::{ExternalStore, QueryRegistry, SizeRegistry};
