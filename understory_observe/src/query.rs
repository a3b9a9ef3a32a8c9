// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport predicate sources and the per-descriptor source cache.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use hashbrown::HashMap;

use crate::subscription::Listener;

/// A listener API the native source does not implement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Unsupported;

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("listener API not supported by this source")
    }
}

impl core::error::Error for Unsupported {}

/// A native viewport predicate, such as a media query list.
///
/// Hosts expose one of two listener styles. The modern pair
/// ([`add_change_listener`](Self::add_change_listener) /
/// [`remove_change_listener`](Self::remove_change_listener)) is tried first; the legacy
/// pair is the fallback and defaults to [`Unsupported`].
pub trait QuerySource {
    /// Whether the predicate currently holds. Read live, not cached.
    fn matches(&self) -> bool;

    /// Attach `listener` through the modern API.
    fn add_change_listener(&self, listener: &Listener) -> Result<(), Unsupported>;

    /// Detach `listener` through the modern API.
    fn remove_change_listener(&self, listener: &Listener) -> Result<(), Unsupported>;

    /// Attach `listener` through the legacy API.
    fn add_legacy_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        let _ = listener;
        Err(Unsupported)
    }

    /// Detach `listener` through the legacy API.
    fn remove_legacy_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        let _ = listener;
        Err(Unsupported)
    }
}

/// Creates predicate sources from descriptor strings.
pub trait QueryEnvironment {
    /// Create a source for `descriptor`, or `None` when no interactive viewport exists
    /// (for example while rendering on a server).
    fn match_query(&self, descriptor: &str) -> Option<Rc<dyn QuerySource>>;
}

impl<T: QueryEnvironment + ?Sized> QueryEnvironment for Rc<T> {
    fn match_query(&self, descriptor: &str) -> Option<Rc<dyn QuerySource>> {
        (**self).match_query(descriptor)
    }
}

/// Source used when there is no viewport: never matches, ignores listeners.
#[derive(Copy, Clone, Debug, Default)]
pub struct InertQuery;

impl QuerySource for InertQuery {
    fn matches(&self) -> bool {
        false
    }

    fn add_change_listener(&self, _listener: &Listener) -> Result<(), Unsupported> {
        Ok(())
    }

    fn remove_change_listener(&self, _listener: &Listener) -> Result<(), Unsupported> {
        Ok(())
    }
}

/// An environment without a viewport or size observer.
///
/// Every query source it yields is inert and no size observer is created, so all
/// snapshots take their non-interactive defaults.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoViewport;

impl QueryEnvironment for NoViewport {
    fn match_query(&self, _descriptor: &str) -> Option<Rc<dyn QuerySource>> {
        None
    }
}

/// Memoizing factory: one source per distinct descriptor for the cache's lifetime.
///
/// Repeated calls with an equal descriptor return the same `Rc`. Without a viewport
/// every descriptor maps to one shared [`InertQuery`].
pub struct QuerySourceCache<Env> {
    env: Env,
    sources: HashMap<Box<str>, Rc<dyn QuerySource>>,
    inert: Rc<dyn QuerySource>,
}

impl<Env: fmt::Debug> fmt::Debug for QuerySourceCache<Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySourceCache")
            .field("env", &self.env)
            .field("sources", &self.sources.len())
            .finish_non_exhaustive()
    }
}

impl<Env: QueryEnvironment> QuerySourceCache<Env> {
    /// Create an empty cache over `env`.
    pub fn new(env: Env) -> Self {
        Self {
            env,
            sources: HashMap::new(),
            inert: Rc::new(InertQuery),
        }
    }

    /// The source for `descriptor`, created on first request.
    pub fn get(&mut self, descriptor: &str) -> Rc<dyn QuerySource> {
        if let Some(source) = self.sources.get(descriptor) {
            return source.clone();
        }
        match self.env.match_query(descriptor) {
            Some(source) => {
                self.sources.insert(descriptor.into(), source.clone());
                source
            }
            None => self.inert.clone(),
        }
    }
}

impl<Env> QuerySourceCache<Env> {
    /// Number of cached native sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if no native source has been created yet.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The wrapped environment.
    pub fn environment(&self) -> &Env {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockViewport;

    #[test]
    fn same_descriptor_same_handle() {
        let mut cache = QuerySourceCache::new(MockViewport::new(800.0));
        let a = cache.get("(min-width: 768px)");
        let b = cache.get("(min-width: 768px)");
        let c = cache.get("(min-width: 1024px)");
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert!(a.matches());
        assert!(!c.matches());
    }

    #[test]
    fn no_viewport_yields_inert_sources() {
        let mut cache = QuerySourceCache::new(NoViewport);
        let a = cache.get("(min-width: 0px)");
        assert!(!a.matches());
        let noop: Listener = Rc::new(|| {});
        assert_eq!(a.add_change_listener(&noop), Ok(()));
        assert_eq!(a.remove_change_listener(&noop), Ok(()));
        assert!(cache.is_empty());
        assert!(Rc::ptr_eq(&a, &cache.get("(min-width: 0px)")));
    }
}
