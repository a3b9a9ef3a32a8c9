// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_observe --heading-base-level=0

//! Understory Observe: shared, refcounted subscriptions over environment observers.
//!
//! Hosts expose two kinds of "the environment changed" primitives: predicates over the
//! viewport (media queries) and box size observation of individual elements. Both are
//! costly to attach and easy to leak when many independent consumers watch the same
//! thing. This crate puts a deduplicating registry in front of each:
//!
//! - [`QueryRegistry`]: keyed by descriptor string. One native change callback per
//!   distinct descriptor, attached on first subscribe and detached when the last
//!   subscriber leaves. Sources come from a [`QuerySourceCache`] over a
//!   [`QueryEnvironment`].
//! - [`SizeRegistry`]: keyed by element identity. One [`SizeObserver`] for the whole
//!   registry, multiplexed over a weak identity map, so observed elements are never
//!   kept alive by it.
//! - [`Subscription`]: the handle both registries return. Unsubscribing is idempotent and
//!   dropping the handle unsubscribes.
//! - [`ExternalStore`]: the subscribe/snapshot/server-snapshot contract, implemented by
//!   [`QueryStore`] and [`WidthStore`] over the registries.
//!
//! Registries are cheap handles over shared state: create one per host and clone it
//! into every consumer. Without an interactive host, pass [`NoViewport`]; every
//! snapshot then takes its non-interactive default.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_observe::mock::MockViewport;
//! use understory_observe::{ExternalStore, QueryRegistry, QueryStore};
//!
//! let viewport = MockViewport::new(1024.0);
//! let registry = QueryRegistry::new(viewport.clone());
//!
//! // Two consumers of the same descriptor share one native listener.
//! let wide = QueryStore::new(&registry, "(min-width: 768px)");
//! let also_wide = QueryStore::new(&registry, "(min-width: 768px)");
//! let seen = Rc::new(Cell::new(0));
//! let s = seen.clone();
//! let _a = wide.subscribe(Rc::new(move || s.set(s.get() + 1)));
//! let _b = also_wide.subscribe(Rc::new(|| {}));
//! assert_eq!(viewport.attached_listeners(), 1);
//!
//! viewport.set_width(640.0);
//! assert_eq!(seen.get(), 1);
//! assert!(!wide.snapshot());
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for dependencies such as `kurbo`.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//! - `tracing`: emits `debug` events when native listeners and observations are attached
//!   or released, and `trace` events for each notification fan-out.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). No internal borrow is held while
//! subscriber callbacks run, so callbacks may subscribe and unsubscribe freely.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod mock;
mod query;
mod query_registry;
mod size;
mod size_registry;
mod store;
mod subscription;

pub use query::{
    InertQuery, NoViewport, QueryEnvironment, QuerySource, QuerySourceCache, Unsupported,
};
pub use query_registry::QueryRegistry;
pub use size::{
    BoxSize, ObservedElement, RecordsCallback, ResizeRecord, SizeEnvironment, SizeObserver,
};
pub use size_registry::SizeRegistry;
pub use store::{ExternalStore, QueryStore, WidthStore};
pub use subscription::{Listener, Subscription};
