// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared registry over one size observer, keyed by element identity.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Size;

use crate::size::{ObservedElement, RecordsCallback, ResizeRecord, SizeEnvironment, SizeObserver};
use crate::subscription::{Listener, SubscriberSet, Subscription, Token, TokenSource};

/// Identity of an observed element: the address of its `Rc` allocation.
///
/// An address cannot be reused while an entry or a subscription still holds a `Weak`
/// to the allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct ElementKey(*const ());

impl ElementKey {
    fn of<E: ?Sized>(element: &Rc<E>) -> Self {
        Self(Rc::as_ptr(element).cast::<()>())
    }
}

struct SizeEntry<E: ?Sized> {
    element: Weak<E>,
    size: Size,
    subscribers: SubscriberSet,
}

struct SizeInner<E: ?Sized> {
    observer: Option<Box<dyn SizeObserver<E>>>,
    entries: HashMap<ElementKey, SizeEntry<E>>,
    tokens: TokenSource,
}

/// Deduplicating subscription registry over a single shared [`SizeObserver`].
///
/// One observer is created when the registry is constructed and multiplexed across
/// every observed element. Entries are keyed by `Rc` identity and hold only a `Weak`
/// to their element, so the registry never keeps an element alive; entries whose
/// element has been dropped are pruned the next time a new element is added.
///
/// Record batches update the cached size and notify subscribers only when the width
/// or height actually changed.
///
/// ```rust
/// use std::rc::Rc;
/// use kurbo::Size;
/// use understory_observe::SizeRegistry;
/// use understory_observe::mock::{MockElement, MockResizeEnvironment};
///
/// let env = MockResizeEnvironment::new();
/// let registry = SizeRegistry::new(&env);
/// let panel = Rc::new(MockElement::new(Size::new(640.0, 480.0)));
///
/// let sub = registry.subscribe(&panel, Rc::new(|| {}));
/// assert_eq!(registry.get_width_snapshot(&panel), 640.0);
///
/// env.resize(&panel, Size::new(900.0, 480.0));
/// assert_eq!(registry.get_width_snapshot(&panel), 900.0);
///
/// sub.unsubscribe();
/// assert!(!env.is_observing(&panel));
/// ```
pub struct SizeRegistry<E: ?Sized> {
    inner: Rc<RefCell<SizeInner<E>>>,
}

impl<E: ?Sized> Clone for SizeRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: ?Sized> fmt::Debug for SizeRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SizeRegistry");
        if let Ok(inner) = self.inner.try_borrow() {
            s.field("interactive", &inner.observer.is_some())
                .field("entries", &inner.entries.len());
        }
        s.finish_non_exhaustive()
    }
}

impl<E: ObservedElement + ?Sized + 'static> SizeInner<E> {
    fn prune(&mut self) {
        self.entries.retain(|_, e| e.element.strong_count() > 0);
    }

    fn ensure(&mut self, element: &Rc<E>) -> &mut SizeEntry<E> {
        let key = ElementKey::of(element);
        if !self.entries.contains_key(&key) {
            self.prune();
        }
        let Self { observer, entries, .. } = self;
        entries.entry(key).or_insert_with(|| {
            if let Some(observer) = observer {
                observer.observe(element);
            }
            let size = element.measure().unwrap_or(Size::ZERO);
            #[cfg(feature = "tracing")]
            tracing::debug!(width = size.width, height = size.height, "element observed");
            SizeEntry {
                element: Rc::downgrade(element),
                size,
                subscribers: SubscriberSet::default(),
            }
        })
    }

    fn release(this: &Rc<RefCell<Self>>, key: ElementKey, token: Token) {
        let removed = {
            let mut inner = this.borrow_mut();
            let Some(entry) = inner.entries.get_mut(&key) else {
                return;
            };
            if !entry.subscribers.remove(token) || !entry.subscribers.is_empty() {
                return;
            }
            inner.entries.remove(&key)
        };
        let Some(entry) = removed else {
            return;
        };
        if let Some(element) = entry.element.upgrade()
            && let Some(observer) = this.borrow().observer.as_ref()
        {
            observer.unobserve(&element);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("element released");
    }

    fn deliver(this: &Rc<RefCell<Self>>, records: &[ResizeRecord<E>]) {
        for record in records {
            let key = ElementKey::of(&record.target);
            let size = record.size();
            let listeners = {
                let Ok(mut inner) = this.try_borrow_mut() else {
                    return;
                };
                let Some(entry) = inner.entries.get_mut(&key) else {
                    continue;
                };
                if entry.size == size {
                    continue;
                }
                entry.size = size;
                entry.subscribers.distinct()
            };
            #[cfg(feature = "tracing")]
            tracing::trace!(
                width = size.width,
                height = size.height,
                subscribers = listeners.len(),
                "element resized"
            );
            for listener in &listeners {
                listener();
            }
        }
    }
}

impl<E: ObservedElement + ?Sized + 'static> SizeRegistry<E> {
    /// Create a registry and its shared observer from `env`.
    pub fn new(env: &impl SizeEnvironment<E>) -> Self {
        let inner = Rc::new_cyclic(|this: &Weak<RefCell<SizeInner<E>>>| {
            let this = this.clone();
            let on_records: RecordsCallback<E> = Box::new(move |records: &[ResizeRecord<E>]| {
                if let Some(inner) = this.upgrade() {
                    SizeInner::deliver(&inner, records);
                }
            });
            RefCell::new(SizeInner {
                observer: env.create_observer(on_records),
                entries: HashMap::new(),
                tokens: TokenSource::default(),
            })
        });
        Self { inner }
    }

    /// Subscribe `listener` to size changes of `element`.
    ///
    /// The first subscription to an element starts observing it and seeds its size from
    /// [`ObservedElement::measure`] (zero if that fails). Dropping the last subscription
    /// stops observing it and discards the entry. Each subscription is counted on its
    /// own, even when several share one listener.
    pub fn subscribe(&self, element: &Rc<E>, listener: Listener) -> Subscription {
        let token = {
            let mut inner = self.inner.borrow_mut();
            let token = inner.tokens.next();
            inner.ensure(element).subscribers.insert(token, listener);
            token
        };
        let this = Rc::downgrade(&self.inner);
        let key = ElementKey::of(element);
        // Holding a `Weak` pins the allocation, so `key` keeps naming this element.
        let pin = Rc::downgrade(element);
        Subscription::new(move || {
            let _pin = &pin;
            if let Some(inner) = this.upgrade() {
                SizeInner::release(&inner, key, token);
            }
        })
    }

    /// Cached width of `element`, measuring it first if it has no entry yet.
    pub fn get_width_snapshot(&self, element: &Rc<E>) -> f64 {
        self.get_size_snapshot(element).width
    }

    /// Cached size of `element`, measuring it first if it has no entry yet.
    pub fn get_size_snapshot(&self, element: &Rc<E>) -> Size {
        self.inner.borrow_mut().ensure(element).size
    }

    /// The width used without an interactive environment: always `0.0`.
    pub fn get_server_snapshot(&self) -> f64 {
        0.0
    }

    /// Whether a native observer exists.
    pub fn is_interactive(&self) -> bool {
        self.inner.borrow().observer.is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Whether `element` has an entry.
    pub fn contains(&self, element: &Rc<E>) -> bool {
        self.inner
            .borrow()
            .entries
            .contains_key(&ElementKey::of(element))
    }

    /// Number of live subscriptions to `element`.
    pub fn listener_count(&self, element: &Rc<E>) -> usize {
        self.inner
            .borrow()
            .entries
            .get(&ElementKey::of(element))
            .map_or(0, |e| e.subscribers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockResizeEnvironment};
    use crate::query::NoViewport;
    use alloc::vec::Vec;
    use core::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Rc::new(move || c.set(c.get() + 1)))
    }

    fn element(w: f64, h: f64) -> Rc<MockElement> {
        Rc::new(MockElement::new(Size::new(w, h)))
    }

    #[test]
    fn one_observation_per_element() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let a = element(100.0, 50.0);
        let b = element(200.0, 50.0);
        let subs: Vec<_> = (0..3)
            .map(|_| registry.subscribe(&a, counter().1))
            .chain((0..2).map(|_| registry.subscribe(&b, counter().1)))
            .collect();
        assert_eq!(env.observers_created(), 1);
        assert_eq!(env.observed_count(), 2);
        assert_eq!(registry.listener_count(&a), 3);

        for sub in &subs[..3] {
            assert!(env.is_observing(&a));
            sub.unsubscribe();
        }
        assert!(!env.is_observing(&a));
        assert!(!registry.contains(&a));
        assert!(env.is_observing(&b));
        drop(subs);
        assert_eq!(env.observed_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn seeds_from_geometry_and_tracks_changes() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(320.0, 100.0);
        let (count, listener) = counter();
        let _sub = registry.subscribe(&el, listener);
        assert_eq!(registry.get_width_snapshot(&el), 320.0);

        env.resize(&el, Size::new(480.0, 100.0));
        assert_eq!(count.get(), 1);
        assert_eq!(registry.get_size_snapshot(&el), Size::new(480.0, 100.0));

        env.resize(&el, Size::new(480.0, 120.0));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn identical_sizes_are_coalesced() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(320.0, 100.0);
        let (count, listener) = counter();
        let _sub = registry.subscribe(&el, listener);
        env.resize(&el, Size::new(320.0, 100.0));
        env.resize(&el, Size::new(320.0, 100.0));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn content_rect_fallback() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(10.0, 10.0);
        let _sub = registry.subscribe(&el, counter().1);
        env.resize_content_rect(&el, kurbo::Rect::new(0.0, 0.0, 55.0, 20.0));
        assert_eq!(registry.get_width_snapshot(&el), 55.0);
    }

    #[test]
    fn unmeasurable_element_starts_at_zero() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = Rc::new(MockElement::unmeasurable());
        assert_eq!(registry.get_width_snapshot(&el), 0.0);
        assert!(registry.contains(&el));
    }

    #[test]
    fn snapshot_is_stable_without_events() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(300.0, 10.0);
        let first = registry.get_width_snapshot(&el);
        el.set_size(Some(Size::new(999.0, 10.0)));
        assert_eq!(registry.get_width_snapshot(&el), first);
    }

    #[test]
    fn registry_does_not_keep_elements_alive() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(10.0, 10.0);
        let weak = Rc::downgrade(&el);
        assert_eq!(registry.get_width_snapshot(&el), 10.0);
        drop(el);
        assert!(weak.upgrade().is_none());

        let other = element(20.0, 20.0);
        let _ = registry.get_width_snapshot(&other);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stale_handles_are_inert() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(10.0, 10.0);
        let old = registry.subscribe(&el, counter().1);
        old.unsubscribe();
        old.unsubscribe();
        assert!(!registry.contains(&el));

        let (count, listener) = counter();
        let _fresh = registry.subscribe(&el, listener);
        old.unsubscribe();
        assert!(env.is_observing(&el));
        env.resize(&el, Size::new(11.0, 10.0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn records_for_unobserved_elements_are_ignored() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let watched = element(10.0, 10.0);
        let stranger = element(10.0, 10.0);
        let (count, listener) = counter();
        let _sub = registry.subscribe(&watched, listener);
        env.deliver(&[ResizeRecord {
            target: stranger.clone(),
            content_box_size: None,
            content_rect: kurbo::Rect::new(0.0, 0.0, 99.0, 99.0),
        }]);
        assert_eq!(count.get(), 0);
        assert!(!registry.contains(&stranger));
    }

    #[test]
    fn shared_listener_is_counted_per_subscription() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(10.0, 10.0);
        let (count, listener) = counter();
        let s1 = registry.subscribe(&el, listener.clone());
        let s2 = registry.subscribe(&el, listener.clone());
        assert_eq!(registry.listener_count(&el), 2);

        env.resize(&el, Size::new(12.0, 10.0));
        assert_eq!(count.get(), 1);

        s1.unsubscribe();
        assert_eq!(registry.listener_count(&el), 1);
        assert!(env.is_observing(&el));
        env.resize(&el, Size::new(14.0, 10.0));
        assert_eq!(count.get(), 2);

        s2.unsubscribe();
        assert!(!env.is_observing(&el));
        assert!(!registry.contains(&el));
    }

    #[test]
    fn shared_listener_survives_interleaved_unsubscribes() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let el = element(10.0, 10.0);
        let (count, listener) = counter();
        let s1 = registry.subscribe(&el, listener.clone());
        let s2 = registry.subscribe(&el, listener.clone());
        s1.unsubscribe();
        let s3 = registry.subscribe(&el, listener.clone());
        s2.unsubscribe();
        assert_eq!(registry.listener_count(&el), 1);
        env.resize(&el, Size::new(20.0, 10.0));
        assert_eq!(count.get(), 1);
        drop(s3);
        assert!(registry.is_empty());
    }

    #[test]
    fn batch_notifies_only_changed_elements() {
        let env = MockResizeEnvironment::new();
        let registry = SizeRegistry::new(&env);
        let still = element(100.0, 10.0);
        let moved = element(200.0, 10.0);
        let (still_count, still_listener) = counter();
        let (moved_count, moved_listener) = counter();
        let _a = registry.subscribe(&still, still_listener);
        let _b = registry.subscribe(&moved, moved_listener);

        env.deliver(&[
            ResizeRecord {
                target: still.clone(),
                content_box_size: None,
                content_rect: kurbo::Rect::new(0.0, 0.0, 100.0, 10.0),
            },
            ResizeRecord {
                target: moved.clone(),
                content_box_size: None,
                content_rect: kurbo::Rect::new(0.0, 0.0, 250.0, 10.0),
            },
        ]);
        assert_eq!(still_count.get(), 0);
        assert_eq!(moved_count.get(), 1);
        assert_eq!(registry.get_width_snapshot(&still), 100.0);
        assert_eq!(registry.get_width_snapshot(&moved), 250.0);
    }

    #[test]
    fn no_observer_without_environment() {
        let registry: SizeRegistry<MockElement> = SizeRegistry::new(&NoViewport);
        assert!(!registry.is_interactive());
        let el = element(42.0, 1.0);
        let (count, listener) = counter();
        let sub = registry.subscribe(&el, listener);
        assert_eq!(registry.get_width_snapshot(&el), 42.0);
        assert_eq!(registry.get_server_snapshot(), 0.0);
        sub.unsubscribe();
        assert_eq!(count.get(), 0);
        assert!(registry.is_empty());
    }
}
