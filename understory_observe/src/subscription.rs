// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener handles and the [`Subscription`] guard.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use smallvec::SmallVec;

/// A change callback.
///
/// Listeners are compared by `Rc` identity: when the same `Rc` is subscribed to one key
/// through several subscriptions, a change calls it once, and it stays registered until
/// every one of those subscriptions is gone.
pub type Listener = Rc<dyn Fn()>;

pub(crate) fn same_listener(a: &Listener, b: &Listener) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Identifies one `subscribe` call within a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Token(u64);

/// Hands out registry-unique [`Token`]s.
#[derive(Debug, Default)]
pub(crate) struct TokenSource(u64);

impl TokenSource {
    pub(crate) fn next(&mut self) -> Token {
        self.0 += 1;
        Token(self.0)
    }
}

/// The live subscriptions of one registry key.
///
/// Each subscription owns its own slot, so removing one never affects another that
/// happens to share the same listener. Fan-out still calls each distinct listener once.
#[derive(Clone, Default)]
pub(crate) struct SubscriberSet {
    slots: SmallVec<[(Token, Listener); 4]>,
}

impl SubscriberSet {
    pub(crate) fn insert(&mut self, token: Token, listener: Listener) {
        self.slots.push((token, listener));
    }

    /// Remove `token`'s slot. Returns `false` if it was already gone.
    pub(crate) fn remove(&mut self, token: Token) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(t, _)| *t != token);
        self.slots.len() != before
    }

    /// Number of live subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Each distinct listener once, in subscription order.
    pub(crate) fn distinct(&self) -> SmallVec<[Listener; 4]> {
        let mut out: SmallVec<[Listener; 4]> = SmallVec::new();
        for (_, listener) in &self.slots {
            if !out.iter().any(|l| same_listener(l, listener)) {
                out.push(listener.clone());
            }
        }
        out
    }
}

impl fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("subscriptions", &self.slots.len())
            .finish()
    }
}

/// Handle returned by `subscribe`; cancels the subscription once.
///
/// [`Subscription::unsubscribe`] is idempotent: the second and later calls do nothing.
/// Dropping the handle unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Wrap a cancel action.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: RefCell::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self {
            cancel: RefCell::new(None),
        }
    }

    /// Combine several subscriptions into one that cancels all of them.
    pub fn merge(parts: impl IntoIterator<Item = Self>) -> Self {
        let parts: SmallVec<[Self; 4]> = parts.into_iter().collect();
        if parts.is_empty() {
            return Self::empty();
        }
        Self::new(move || {
            for part in &parts {
                part.unsubscribe();
            }
        })
    }

    /// Returns `true` until the subscription has been cancelled.
    pub fn is_active(&self) -> bool {
        self.cancel.borrow().is_some()
    }

    /// Cancel the subscription. Safe to call more than once.
    pub fn unsubscribe(&self) {
        // Take first so the cancel action runs without the cell borrowed.
        let cancel = self.cancel.borrow_mut().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn cancel_runs_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = Subscription::new(move || c.set(c.get() + 1));
        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_cancels() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        drop(Subscription::new(move || c.set(c.get() + 1)));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn merged_cancels_every_part() {
        let count = Rc::new(Cell::new(0));
        let parts = (0..3).map(|_| {
            let c = count.clone();
            Subscription::new(move || c.set(c.get() + 1))
        });
        let all = Subscription::merge(parts);
        all.unsubscribe();
        all.unsubscribe();
        assert_eq!(count.get(), 3);
        assert!(!Subscription::merge([]).is_active());
    }

    #[test]
    fn subscriber_slots_are_independent() {
        let mut tokens = TokenSource::default();
        let shared: Listener = Rc::new(|| {});
        let other: Listener = Rc::new(|| {});
        let (a, b, c) = (tokens.next(), tokens.next(), tokens.next());
        let mut set = SubscriberSet::default();
        set.insert(a, shared.clone());
        set.insert(b, shared.clone());
        set.insert(c, other);
        assert_eq!(set.len(), 3);
        assert_eq!(set.distinct().len(), 2);

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.distinct().len(), 2);
        assert!(set.remove(b));
        assert_eq!(set.distinct().len(), 1);
        assert!(set.remove(c));
        assert!(set.is_empty());
    }

    #[test]
    fn listener_identity() {
        let a: Listener = Rc::new(|| {});
        let b: Listener = Rc::new(|| {});
        assert!(same_listener(&a, &a.clone()));
        assert!(!same_listener(&a, &b));
    }
}
