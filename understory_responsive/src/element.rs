// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stores derived from the observed width of one element.

use alloc::rc::Rc;
use core::fmt;

use understory_breakpoints::{
    BreakpointTable, CONTAINER_BREAKPOINTS, CompiledCondition, Condition, ContainerBreakpoint,
    Label, resolve,
};
use understory_observe::{
    ExternalStore, Listener, ObservedElement, SizeRegistry, Subscription, WidthStore,
};

/// The breakpoint an element's own width falls in (a container query).
///
/// Without an element the width reads as `0.0`, so the store resolves to the first label
/// and never notifies.
pub struct ElementBreakpoint<E: ?Sized, L: Label> {
    width: WidthStore<E>,
    table: BreakpointTable<L>,
}

impl<E: ?Sized, L: Label> fmt::Debug for ElementBreakpoint<E, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementBreakpoint")
            .field("width", &self.width)
            .field("table", &self.table)
            .finish()
    }
}

impl<E: ObservedElement + ?Sized + 'static, L: Label> ElementBreakpoint<E, L> {
    /// A store for `element` resolving against `table`.
    pub fn new(
        registry: &SizeRegistry<E>,
        element: Option<Rc<E>>,
        table: BreakpointTable<L>,
    ) -> Self {
        Self {
            width: WidthStore::new(registry, element),
            table,
        }
    }

    /// The current width the label is resolved from.
    pub fn width(&self) -> f64 {
        self.width.snapshot()
    }
}

impl<E: ObservedElement + ?Sized + 'static, L: Label> ExternalStore for ElementBreakpoint<E, L> {
    type Snapshot = L;

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.width.subscribe(listener)
    }

    fn snapshot(&self) -> L {
        resolve(self.width.snapshot(), &self.table)
    }

    fn server_snapshot(&self) -> L {
        resolve(self.width.server_snapshot(), &self.table)
    }
}

/// Whether an element's width satisfies a [`Condition`].
///
/// Uses the same compiled bounds as viewport conditions, evaluated against the element
/// width instead of through a query. A vacuous condition always holds and subscribes to
/// nothing.
pub struct ElementCondition<E: ?Sized> {
    width: WidthStore<E>,
    compiled: Option<CompiledCondition>,
}

impl<E: ?Sized> fmt::Debug for ElementCondition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCondition")
            .field("width", &self.width)
            .field("compiled", &self.compiled)
            .finish()
    }
}

impl<E: ObservedElement + ?Sized + 'static> ElementCondition<E> {
    /// A store for `condition` over `table`, evaluated against `element`.
    pub fn new<L: Label>(
        registry: &SizeRegistry<E>,
        element: Option<Rc<E>>,
        condition: &Condition<L>,
        table: &BreakpointTable<L>,
    ) -> Self {
        Self {
            width: WidthStore::new(registry, element),
            compiled: condition.compile(table),
        }
    }
}

impl<E: ObservedElement + ?Sized + 'static> ExternalStore for ElementCondition<E> {
    type Snapshot = bool;

    fn subscribe(&self, listener: Listener) -> Subscription {
        if self.compiled.is_none() {
            return Subscription::empty();
        }
        self.width.subscribe(listener)
    }

    fn snapshot(&self) -> bool {
        self.compiled.is_none_or(|c| c.matches(self.width.snapshot()))
    }

    fn server_snapshot(&self) -> bool {
        false
    }
}

/// The [`ContainerBreakpoint`] of `element`'s width.
pub fn element_breakpoint<E: ObservedElement + ?Sized + 'static>(
    registry: &SizeRegistry<E>,
    element: Option<Rc<E>>,
) -> ElementBreakpoint<E, ContainerBreakpoint> {
    ElementBreakpoint::new(registry, element, CONTAINER_BREAKPOINTS)
}

/// Whether `element`'s width satisfies `condition` over the [`ContainerBreakpoint`] table.
pub fn element_condition<E: ObservedElement + ?Sized + 'static>(
    registry: &SizeRegistry<E>,
    element: Option<Rc<E>>,
    condition: &Condition<ContainerBreakpoint>,
) -> ElementCondition<E> {
    ElementCondition::new(registry, element, condition, &CONTAINER_BREAKPOINTS)
}
