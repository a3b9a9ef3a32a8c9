// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stores derived from viewport predicates.

use alloc::boxed::Box;
use core::fmt;

use smallvec::SmallVec;
use understory_breakpoints::{
    Breakpoint, BreakpointTable, CONTAINER_BREAKPOINTS, CompiledCondition, Condition,
    ContainerBreakpoint, Label, VIEWPORT_BREAKPOINTS, resolve_with,
};
use understory_observe::{ExternalStore, Listener, QueryEnvironment, QueryRegistry, Subscription};

/// The active breakpoint of the viewport.
///
/// Watches one `(min-width: Npx)` descriptor per tier above the first and resolves the
/// label from their current results, so it only notifies when a threshold is crossed.
/// Every store over the same registry shares those descriptors' native listeners.
pub struct ViewportBreakpoint<L: Label, Env> {
    registry: QueryRegistry<Env>,
    table: BreakpointTable<L>,
    descriptors: SmallVec<[Box<str>; 10]>,
}

impl<L: Label, Env> fmt::Debug for ViewportBreakpoint<L, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportBreakpoint")
            .field("table", &self.table)
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}

impl<L: Label, Env: QueryEnvironment + 'static> ViewportBreakpoint<L, Env> {
    /// A store resolving against `table`.
    pub fn new(registry: &QueryRegistry<Env>, table: BreakpointTable<L>) -> Self {
        let descriptors: SmallVec<[Box<str>; 10]> = table.tiers()[1..]
            .iter()
            .map(|&(_, t)| Box::from(CompiledCondition::at_least(t).descriptor()))
            .collect();
        Self {
            registry: registry.clone(),
            table,
            descriptors,
        }
    }

    /// The table labels are resolved against.
    pub fn table(&self) -> &BreakpointTable<L> {
        &self.table
    }
}

impl<L: Label, Env: QueryEnvironment + 'static> ExternalStore for ViewportBreakpoint<L, Env> {
    type Snapshot = L;

    fn subscribe(&self, listener: Listener) -> Subscription {
        Subscription::merge(
            self.descriptors
                .iter()
                .map(|d| self.registry.subscribe(d, listener.clone())),
        )
    }

    fn snapshot(&self) -> L {
        // `resolve_with` visits tiers above the first in order, one per descriptor.
        let mut descriptors = self.descriptors.iter();
        resolve_with(&self.table, |_| {
            descriptors
                .next()
                .is_some_and(|d| self.registry.get_snapshot(d))
        })
    }

    fn server_snapshot(&self) -> L {
        self.table.first()
    }
}

/// Whether the viewport satisfies a [`Condition`].
///
/// The condition is compiled once into a single descriptor. A vacuous condition always
/// holds and subscribes to nothing.
pub struct ViewportCondition<Env> {
    registry: QueryRegistry<Env>,
    descriptor: Option<Box<str>>,
}

impl<Env> fmt::Debug for ViewportCondition<Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportCondition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<Env: QueryEnvironment + 'static> ViewportCondition<Env> {
    /// A store for `condition` over `table`.
    pub fn new<L: Label>(
        registry: &QueryRegistry<Env>,
        condition: &Condition<L>,
        table: &BreakpointTable<L>,
    ) -> Self {
        Self {
            registry: registry.clone(),
            descriptor: condition.compile(table).map(|c| c.descriptor().into()),
        }
    }

    /// The compiled descriptor, or `None` for a vacuous condition.
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }
}

impl<Env: QueryEnvironment + 'static> ExternalStore for ViewportCondition<Env> {
    type Snapshot = bool;

    fn subscribe(&self, listener: Listener) -> Subscription {
        match &self.descriptor {
            Some(d) => self.registry.subscribe(d, listener),
            None => Subscription::empty(),
        }
    }

    fn snapshot(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_none_or(|d| self.registry.get_snapshot(d))
    }

    fn server_snapshot(&self) -> bool {
        self.registry.get_server_snapshot()
    }
}

/// The active [`Breakpoint`] of the viewport.
pub fn viewport_breakpoint<Env: QueryEnvironment + 'static>(
    registry: &QueryRegistry<Env>,
) -> ViewportBreakpoint<Breakpoint, Env> {
    ViewportBreakpoint::new(registry, VIEWPORT_BREAKPOINTS)
}

/// The active [`ContainerBreakpoint`] of the viewport.
pub fn viewport_container_breakpoint<Env: QueryEnvironment + 'static>(
    registry: &QueryRegistry<Env>,
) -> ViewportBreakpoint<ContainerBreakpoint, Env> {
    ViewportBreakpoint::new(registry, CONTAINER_BREAKPOINTS)
}

/// Whether the viewport satisfies `condition` over the [`Breakpoint`] table.
pub fn viewport_condition<Env: QueryEnvironment + 'static>(
    registry: &QueryRegistry<Env>,
    condition: &Condition<Breakpoint>,
) -> ViewportCondition<Env> {
    ViewportCondition::new(registry, condition, &VIEWPORT_BREAKPOINTS)
}

/// Whether the viewport satisfies `condition` over the [`ContainerBreakpoint`] table.
pub fn viewport_container_condition<Env: QueryEnvironment + 'static>(
    registry: &QueryRegistry<Env>,
    condition: &Condition<ContainerBreakpoint>,
) -> ViewportCondition<Env> {
    ViewportCondition::new(registry, condition, &CONTAINER_BREAKPOINTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use understory_observe::NoViewport;
    use understory_observe::mock::MockViewport;

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Rc::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn breakpoint_follows_width() {
        let viewport = MockViewport::new(700.0);
        let registry = QueryRegistry::new(viewport.clone());
        let store = viewport_breakpoint(&registry);
        assert_eq!(store.snapshot(), Breakpoint::Sm);
        viewport.set_width(1024.0);
        assert_eq!(store.snapshot(), Breakpoint::Lg);
        viewport.set_width(3000.0);
        assert_eq!(store.snapshot(), Breakpoint::X5l);
        viewport.set_width(10.0);
        assert_eq!(store.snapshot(), Breakpoint::Xs);
    }

    #[test]
    fn container_table_reaches_upper_tiers() {
        let viewport = MockViewport::new(2900.0);
        let registry = QueryRegistry::new(viewport);
        assert_eq!(
            viewport_container_breakpoint(&registry).snapshot(),
            ContainerBreakpoint::X7l
        );
        assert_eq!(viewport_breakpoint(&registry).snapshot(), Breakpoint::X5l);
    }

    #[test]
    fn breakpoint_stores_share_native_listeners() {
        let viewport = MockViewport::new(800.0);
        let registry = QueryRegistry::new(viewport.clone());
        let stores: Vec<_> = (0..4).map(|_| viewport_breakpoint(&registry)).collect();
        let subs: Vec<_> = stores.iter().map(|s| s.subscribe(counter().1)).collect();
        let tiers = VIEWPORT_BREAKPOINTS.len() - 1;
        assert_eq!(viewport.attached_listeners(), tiers);
        assert_eq!(registry.listener_count("(min-width: 768px)"), 4);
        drop(subs);
        assert_eq!(viewport.attached_listeners(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn breakpoint_notifies_on_crossing_only() {
        let viewport = MockViewport::new(800.0);
        let registry = QueryRegistry::new(viewport.clone());
        let store = viewport_breakpoint(&registry);
        let (count, listener) = counter();
        let _sub = store.subscribe(listener);
        viewport.set_width(900.0);
        assert_eq!(count.get(), 0);
        viewport.set_width(1100.0);
        assert_eq!(count.get(), 1);
        assert_eq!(store.snapshot(), Breakpoint::Lg);
    }

    #[test]
    fn breakpoint_without_viewport() {
        let registry = QueryRegistry::new(NoViewport);
        let store = viewport_breakpoint(&registry);
        assert_eq!(store.snapshot(), Breakpoint::Xs);
        assert_eq!(store.server_snapshot(), Breakpoint::Xs);
    }

    #[test]
    fn condition_larger_than_sm() {
        let viewport = MockViewport::new(640.0);
        let registry = QueryRegistry::new(viewport.clone());
        let store = viewport_condition(&registry, &Condition::larger_than(Breakpoint::Sm));
        assert_eq!(store.descriptor(), Some("(min-width: 640.02px)"));
        let (count, listener) = counter();
        let _sub = store.subscribe(listener);
        assert!(!store.snapshot());
        viewport.set_width(641.0);
        assert!(store.snapshot());
        assert_eq!(count.get(), 1);
        assert!(!store.server_snapshot());
    }

    #[test]
    fn only_at_conditions_do_not_overlap() {
        let viewport = MockViewport::new(768.0);
        let registry = QueryRegistry::new(viewport.clone());
        let sm = viewport_condition(&registry, &Condition::only_at(Breakpoint::Sm));
        let md = viewport_condition(&registry, &Condition::only_at(Breakpoint::Md));
        for width in [639.0, 640.0, 700.0, 767.0, 767.99, 768.0, 1000.0, 1023.5] {
            viewport.set_width(width);
            assert!(!(sm.snapshot() && md.snapshot()), "overlap at {width}");
        }
        viewport.set_width(767.0);
        assert!(sm.snapshot());
        viewport.set_width(768.0);
        assert!(md.snapshot());
    }

    #[test]
    fn condition_descriptor_shared_with_tier_query() {
        let viewport = MockViewport::new(800.0);
        let registry = QueryRegistry::new(viewport.clone());
        let cond = viewport_condition(&registry, &Condition::only_at(Breakpoint::X5l));
        assert_eq!(cond.descriptor(), Some("(min-width: 2304px)"));
        let bp = viewport_breakpoint(&registry);
        let _a = cond.subscribe(counter().1);
        let _b = bp.subscribe(counter().1);
        assert_eq!(registry.listener_count("(min-width: 2304px)"), 2);
        assert_eq!(viewport.attached_listeners(), VIEWPORT_BREAKPOINTS.len() - 1);
    }

    #[test]
    fn shared_rerender_survives_dropping_one_store() {
        let viewport = MockViewport::new(2300.0);
        let registry = QueryRegistry::new(viewport.clone());
        let bp = viewport_breakpoint(&registry);
        let cond = viewport_condition(&registry, &Condition::only_at(Breakpoint::X5l));
        let (count, rerender) = counter();
        let _bp_sub = bp.subscribe(rerender.clone());
        let cond_sub = cond.subscribe(rerender);
        assert_eq!(registry.listener_count("(min-width: 2304px)"), 2);

        drop(cond_sub);
        assert_eq!(registry.listener_count("(min-width: 2304px)"), 1);
        viewport.set_width(2310.0);
        assert_eq!(count.get(), 1);
        assert_eq!(bp.snapshot(), Breakpoint::X5l);
    }

    #[test]
    fn vacuous_condition_always_holds() {
        let viewport = MockViewport::new(0.0);
        let registry = QueryRegistry::new(viewport.clone());
        let store = viewport_container_condition(&registry, &Condition::default());
        assert_eq!(store.descriptor(), None);
        let sub = store.subscribe(counter().1);
        assert!(!sub.is_active());
        assert!(store.snapshot());
        assert_eq!(viewport.query_count(), 0);
    }
}
