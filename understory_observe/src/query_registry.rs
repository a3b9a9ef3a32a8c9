// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared registry over viewport predicate sources, keyed by descriptor.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;

use crate::query::{QueryEnvironment, QuerySource, QuerySourceCache};
use crate::subscription::{Listener, SubscriberSet, Subscription, Token, TokenSource};

/// Which listener API the native callback went through.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Attachment {
    Modern,
    Legacy,
    Detached,
}

struct QueryEntry {
    source: Rc<dyn QuerySource>,
    on_change: Listener,
    attachment: Attachment,
    subscribers: SubscriberSet,
}

struct Inner<Env> {
    sources: QuerySourceCache<Env>,
    entries: HashMap<Box<str>, QueryEntry>,
    tokens: TokenSource,
}

/// Deduplicating subscription registry over [`QuerySource`]s.
///
/// Each distinct descriptor has at most one entry. The entry owns exactly one native
/// change callback, attached when the entry is created and detached the moment its
/// last subscriber leaves, so the number of native listeners is bounded by the number
/// of descriptors in use rather than by the number of subscribers.
///
/// The registry is a cheap handle: clones share the same entries. It is single-threaded
/// and never holds an internal borrow while subscriber callbacks run, so callbacks may
/// subscribe or unsubscribe freely.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_observe::{Listener, QueryRegistry, mock::MockViewport};
///
/// let viewport = MockViewport::new(1024.0);
/// let registry = QueryRegistry::new(viewport.clone());
///
/// let hits = Rc::new(Cell::new(0));
/// let h = hits.clone();
/// let listener: Listener = Rc::new(move || h.set(h.get() + 1));
/// let sub = registry.subscribe("(min-width: 768px)", listener);
/// assert!(registry.get_snapshot("(min-width: 768px)"));
///
/// viewport.set_width(700.0);
/// assert_eq!(hits.get(), 1);
/// assert!(!registry.get_snapshot("(min-width: 768px)"));
///
/// sub.unsubscribe();
/// assert!(!registry.contains("(min-width: 768px)"));
/// ```
pub struct QueryRegistry<Env> {
    inner: Rc<RefCell<Inner<Env>>>,
}

impl<Env> Clone for QueryRegistry<Env> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Env> fmt::Debug for QueryRegistry<Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.try_borrow();
        let mut s = f.debug_struct("QueryRegistry");
        if let Ok(inner) = inner {
            s.field("entries", &inner.entries.len())
                .field("sources", &inner.sources.len());
        }
        s.finish_non_exhaustive()
    }
}

fn attach(source: &dyn QuerySource, on_change: &Listener) -> Attachment {
    if source.add_change_listener(on_change).is_ok() {
        return Attachment::Modern;
    }
    if source.add_legacy_listener(on_change).is_ok() {
        #[cfg(feature = "tracing")]
        tracing::debug!("query source attached through legacy listener API");
        return Attachment::Legacy;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!("query source supports no listener API; treating as detached");
    Attachment::Detached
}

fn detach(entry: &QueryEntry) {
    let source = &*entry.source;
    match entry.attachment {
        Attachment::Modern => {
            if source.remove_change_listener(&entry.on_change).is_err() {
                let _ = source.remove_legacy_listener(&entry.on_change);
            }
        }
        Attachment::Legacy => {
            let _ = source.remove_legacy_listener(&entry.on_change);
        }
        Attachment::Detached => {}
    }
}

impl<Env: QueryEnvironment + 'static> Inner<Env> {
    fn ensure(&mut self, descriptor: &str, this: &Weak<RefCell<Self>>) -> &mut QueryEntry {
        let Self { sources, entries, .. } = self;
        entries.entry(Box::from(descriptor)).or_insert_with(|| {
            let source = sources.get(descriptor);
            let on_change = notifier(this.clone(), Box::from(descriptor));
            let attachment = attach(&*source, &on_change);
            #[cfg(feature = "tracing")]
            tracing::debug!(descriptor, ?attachment, "query entry created");
            QueryEntry {
                source,
                on_change,
                attachment,
                subscribers: SubscriberSet::default(),
            }
        })
    }

    fn release(this: &Rc<RefCell<Self>>, key: &str, token: Token) {
        let removed = {
            let mut inner = this.borrow_mut();
            let Some(entry) = inner.entries.get_mut(key) else {
                return;
            };
            if !entry.subscribers.remove(token) || !entry.subscribers.is_empty() {
                return;
            }
            inner.entries.remove(key)
        };
        if let Some(entry) = removed {
            detach(&entry);
            #[cfg(feature = "tracing")]
            tracing::debug!(descriptor = key, "query entry released");
        }
    }
}

impl<Env> Drop for Inner<Env> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            detach(entry);
        }
    }
}

/// The single native callback for one entry: fans out to its current subscribers.
fn notifier<Env: 'static>(this: Weak<RefCell<Inner<Env>>>, key: Box<str>) -> Listener {
    Rc::new(move || {
        let Some(inner) = this.upgrade() else {
            return;
        };
        let listeners = match inner.try_borrow() {
            Ok(inner) => match inner.entries.get(&*key) {
                Some(entry) => entry.subscribers.distinct(),
                None => return,
            },
            // Fired while the entry is still being attached; it has no subscribers yet.
            Err(_) => return,
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(descriptor = &*key, subscribers = listeners.len(), "query changed");
        for listener in &listeners {
            listener();
        }
    })
}

impl<Env: QueryEnvironment + 'static> QueryRegistry<Env> {
    /// Create an empty registry that builds sources from `env`.
    pub fn new(env: Env) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                sources: QuerySourceCache::new(env),
                entries: HashMap::new(),
                tokens: TokenSource::default(),
            })),
        }
    }

    /// Subscribe `listener` to changes of `descriptor`.
    ///
    /// Creates the entry and attaches the native callback on first use. The returned
    /// [`Subscription`] removes only itself; when it was the last subscription to
    /// `descriptor`, the native callback is detached and the entry dropped.
    pub fn subscribe(&self, descriptor: &str, listener: Listener) -> Subscription {
        let token = {
            let weak = Rc::downgrade(&self.inner);
            let mut inner = self.inner.borrow_mut();
            let token = inner.tokens.next();
            inner.ensure(descriptor, &weak).subscribers.insert(token, listener);
            token
        };
        let weak = Rc::downgrade(&self.inner);
        let key: Box<str> = Box::from(descriptor);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::release(&inner, &key, token);
            }
        })
    }

    /// Whether `descriptor` currently matches.
    ///
    /// Reads the source directly rather than a cached copy. Creates the entry if it does
    /// not exist yet, so the first render can read a value before anyone subscribes.
    pub fn get_snapshot(&self, descriptor: &str) -> bool {
        let source = {
            let weak = Rc::downgrade(&self.inner);
            let mut inner = self.inner.borrow_mut();
            inner.ensure(descriptor, &weak).source.clone()
        };
        source.matches()
    }

    /// The value used without an interactive viewport: always `false`.
    pub fn get_server_snapshot(&self) -> bool {
        false
    }

    /// Number of live entries (distinct descriptors with a native callback).
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Whether an entry exists for `descriptor`.
    pub fn contains(&self, descriptor: &str) -> bool {
        self.inner.borrow().entries.contains_key(descriptor)
    }

    /// Number of live subscriptions to `descriptor`.
    pub fn listener_count(&self, descriptor: &str) -> usize {
        self.inner
            .borrow()
            .entries
            .get(descriptor)
            .map_or(0, |e| e.subscribers.len())
    }
}
