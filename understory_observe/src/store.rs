// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The subscribe/snapshot contract consumers bind to, and its registry adapters.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use crate::query::QueryEnvironment;
use crate::query_registry::QueryRegistry;
use crate::size::ObservedElement;
use crate::size_registry::SizeRegistry;
use crate::subscription::{Listener, Subscription};

/// A source of values that change over time.
///
/// A consumer reads [`snapshot`](Self::snapshot) at render time and calls
/// [`subscribe`](Self::subscribe) to learn when it should read again. Snapshots must be
/// stable: two reads with no intervening notification compare equal.
/// [`server_snapshot`](Self::server_snapshot) is the value to use when rendering
/// without an interactive host.
pub trait ExternalStore {
    /// The observed value.
    type Snapshot: Clone + PartialEq;

    /// Call `listener` whenever the snapshot may have changed.
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// Current value.
    fn snapshot(&self) -> Self::Snapshot;

    /// Value used without an interactive host.
    fn server_snapshot(&self) -> Self::Snapshot;
}

/// A single viewport descriptor viewed as a boolean store.
pub struct QueryStore<Env> {
    registry: QueryRegistry<Env>,
    descriptor: Box<str>,
}

impl<Env> fmt::Debug for QueryStore<Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStore")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<Env: QueryEnvironment + 'static> QueryStore<Env> {
    /// A store for `descriptor` backed by `registry`.
    pub fn new(registry: &QueryRegistry<Env>, descriptor: &str) -> Self {
        Self {
            registry: registry.clone(),
            descriptor: descriptor.into(),
        }
    }

    /// The descriptor this store evaluates.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl<Env: QueryEnvironment + 'static> ExternalStore for QueryStore<Env> {
    type Snapshot = bool;

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.registry.subscribe(&self.descriptor, listener)
    }

    fn snapshot(&self) -> bool {
        self.registry.get_snapshot(&self.descriptor)
    }

    fn server_snapshot(&self) -> bool {
        self.registry.get_server_snapshot()
    }
}

/// The width of one element viewed as a store.
///
/// Without an element (not yet mounted) the store never notifies and reads `0.0`.
pub struct WidthStore<E: ?Sized> {
    registry: SizeRegistry<E>,
    element: Option<Rc<E>>,
}

impl<E: ?Sized> fmt::Debug for WidthStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidthStore")
            .field("registry", &self.registry)
            .field("attached", &self.element.is_some())
            .finish()
    }
}

impl<E: ObservedElement + ?Sized + 'static> WidthStore<E> {
    /// A store for `element` backed by `registry`.
    pub fn new(registry: &SizeRegistry<E>, element: Option<Rc<E>>) -> Self {
        Self {
            registry: registry.clone(),
            element,
        }
    }

    /// The observed element, if any.
    pub fn element(&self) -> Option<&Rc<E>> {
        self.element.as_ref()
    }
}

impl<E: ObservedElement + ?Sized + 'static> ExternalStore for WidthStore<E> {
    type Snapshot = f64;

    fn subscribe(&self, listener: Listener) -> Subscription {
        match &self.element {
            Some(element) => self.registry.subscribe(element, listener),
            None => Subscription::empty(),
        }
    }

    fn snapshot(&self) -> f64 {
        self.element
            .as_ref()
            .map_or(0.0, |e| self.registry.get_width_snapshot(e))
    }

    fn server_snapshot(&self) -> f64 {
        self.registry.get_server_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockResizeEnvironment, MockViewport};
    use core::cell::Cell;
    use kurbo::Size;

    #[test]
    fn query_store_follows_viewport() {
        let viewport = MockViewport::new(1200.0);
        let registry = QueryRegistry::new(viewport.clone());
        let store = QueryStore::new(&registry, "(min-width: 1024px)");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = store.subscribe(Rc::new(move || h.set(h.get() + 1)));
        assert!(store.snapshot());
        assert!(!store.server_snapshot());
        viewport.set_width(1000.0);
        assert_eq!(hits.get(), 1);
        assert!(!store.snapshot());
        drop(sub);
        assert_eq!(viewport.attached_listeners(), 0);
    }

    #[test]
    fn width_store_without_element() {
        let env = MockResizeEnvironment::<MockElement>::new();
        let registry = SizeRegistry::new(&env);
        let store = WidthStore::new(&registry, None);
        let sub = store.subscribe(Rc::new(|| {}));
        assert!(!sub.is_active());
        assert_eq!(store.snapshot(), 0.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn width_store_tracks_element() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = Rc::new(MockElement::new(Size::new(300.0, 40.0)));
        let store = WidthStore::new(&registry, Some(el.clone()));
        let _sub = store.subscribe(Rc::new(|| {}));
        assert_eq!(store.snapshot(), 300.0);
        env.resize(&el, Size::new(720.0, 40.0));
        assert_eq!(store.snapshot(), 720.0);
        assert_eq!(store.server_snapshot(), 0.0);
    }
}
