// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable in-memory environments for tests and headless hosts.
//!
//! [`MockViewport`] evaluates `min-width`/`max-width` descriptors against a width you
//! set, and [`MockResizeEnvironment`] delivers size records on demand. Both count the
//! native listeners and observations the registries hold, so lifecycle behavior can
//! be asserted directly.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::{Rect, Size};

use crate::query::{QueryEnvironment, QuerySource, Unsupported};
use crate::size::{
    BoxSize, ObservedElement, RecordsCallback, ResizeRecord, SizeEnvironment, SizeObserver,
};
use crate::subscription::{Listener, same_listener};

/// Parsed `min-width`/`max-width` clauses of a descriptor.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

fn parse_descriptor(descriptor: &str) -> Option<Bounds> {
    let mut bounds = Bounds {
        min: None,
        max: None,
    };
    let descriptor = descriptor.trim();
    match descriptor {
        "all" => return Some(bounds),
        "not all" => return None,
        _ => {}
    }
    for clause in descriptor.split(" and ") {
        let body = clause.trim().strip_prefix('(')?.strip_suffix(')')?;
        let (feature, value) = body.split_once(':')?;
        match feature.trim() {
            "min-width" => bounds.min = Some(parse_px(value)?),
            "max-width" => bounds.max = Some(parse_px(value)?),
            _ => return None,
        }
    }
    Some(bounds)
}

impl Bounds {
    fn matches(&self, width: f64) -> bool {
        self.min.is_none_or(|m| width >= m) && self.max.is_none_or(|m| width <= m)
    }
}

struct MockQuery {
    // `None` when the descriptor was not understood; such a query never matches.
    bounds: Option<Bounds>,
    width: Rc<Cell<f64>>,
    modern: bool,
    legacy: bool,
    last: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl MockQuery {
    fn evaluate(&self) -> bool {
        self.bounds.is_some_and(|b| b.matches(self.width.get()))
    }

    fn add(&self, listener: &Listener) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|l| same_listener(l, listener)) {
            listeners.push(listener.clone());
        }
    }

    fn remove(&self, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .retain(|l| !same_listener(l, listener));
    }
}

impl QuerySource for MockQuery {
    fn matches(&self) -> bool {
        self.evaluate()
    }

    fn add_change_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        if !self.modern {
            return Err(Unsupported);
        }
        self.add(listener);
        Ok(())
    }

    fn remove_change_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        if !self.modern {
            return Err(Unsupported);
        }
        self.remove(listener);
        Ok(())
    }

    fn add_legacy_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        if !self.legacy {
            return Err(Unsupported);
        }
        self.add(listener);
        Ok(())
    }

    fn remove_legacy_listener(&self, listener: &Listener) -> Result<(), Unsupported> {
        if !self.legacy {
            return Err(Unsupported);
        }
        self.remove(listener);
        Ok(())
    }
}

struct ViewportState {
    width: Rc<Cell<f64>>,
    interactive: bool,
    modern: bool,
    legacy: bool,
    queries: RefCell<Vec<Weak<MockQuery>>>,
}

/// An in-memory viewport with a settable width.
///
/// Clones share state, so a test can hand one clone to a registry and drive the other.
#[derive(Clone)]
pub struct MockViewport {
    state: Rc<ViewportState>,
}

impl fmt::Debug for MockViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockViewport")
            .field("width", &self.state.width.get())
            .field("interactive", &self.state.interactive)
            .field("modern", &self.state.modern)
            .field("legacy", &self.state.legacy)
            .field("queries", &self.query_count())
            .finish()
    }
}

impl MockViewport {
    /// An interactive viewport of the given width supporting the modern listener API.
    pub fn new(width: f64) -> Self {
        Self::with_flags(width, true, true, true)
    }

    fn with_flags(width: f64, interactive: bool, modern: bool, legacy: bool) -> Self {
        Self {
            state: Rc::new(ViewportState {
                width: Rc::new(Cell::new(width)),
                interactive,
                modern,
                legacy,
                queries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A fresh viewport at this width whose sources only accept legacy listeners.
    pub fn legacy_only(self) -> Self {
        Self::with_flags(self.state.width.get(), self.state.interactive, false, true)
    }

    /// A fresh viewport at this width whose sources reject both listener APIs.
    ///
    /// Their results can still be read, but they never notify.
    pub fn without_listener_api(self) -> Self {
        Self::with_flags(self.state.width.get(), self.state.interactive, false, false)
    }

    /// A fresh viewport at this width that creates no sources at all.
    pub fn non_interactive(self) -> Self {
        let state = &self.state;
        Self::with_flags(state.width.get(), false, state.modern, state.legacy)
    }

    /// Current width.
    pub fn width(&self) -> f64 {
        self.state.width.get()
    }

    /// Change the width and notify the listeners of every source whose result flipped.
    pub fn set_width(&self, width: f64) {
        self.state.width.set(width);
        let live: Vec<Rc<MockQuery>> = {
            let mut queries = self.state.queries.borrow_mut();
            queries.retain(|q| q.strong_count() > 0);
            queries.iter().filter_map(Weak::upgrade).collect()
        };
        for query in live {
            let now = query.evaluate();
            if now == query.last.replace(now) {
                continue;
            }
            let listeners = query.listeners.borrow().clone();
            for listener in &listeners {
                listener();
            }
        }
    }

    /// Total native listeners attached across all live sources.
    pub fn attached_listeners(&self) -> usize {
        self.state
            .queries
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|q| q.listeners.borrow().len())
            .sum()
    }

    /// Number of live sources created so far.
    pub fn query_count(&self) -> usize {
        self.state
            .queries
            .borrow()
            .iter()
            .filter(|q| q.strong_count() > 0)
            .count()
    }
}

impl QueryEnvironment for MockViewport {
    fn match_query(&self, descriptor: &str) -> Option<Rc<dyn QuerySource>> {
        if !self.state.interactive {
            return None;
        }
        let query = Rc::new(MockQuery {
            bounds: parse_descriptor(descriptor),
            width: self.state.width.clone(),
            modern: self.state.modern,
            legacy: self.state.legacy,
            last: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        });
        query.last.set(query.evaluate());
        self.state.queries.borrow_mut().push(Rc::downgrade(&query));
        Some(query)
    }
}

/// A measurable element with settable geometry.
#[derive(Debug, Default)]
pub struct MockElement {
    size: Cell<Option<Size>>,
}

impl MockElement {
    /// An element measuring `size`.
    pub fn new(size: Size) -> Self {
        Self {
            size: Cell::new(Some(size)),
        }
    }

    /// An element whose geometry cannot be read.
    pub fn unmeasurable() -> Self {
        Self::default()
    }

    /// Change what [`ObservedElement::measure`] returns. Does not deliver a record.
    pub fn set_size(&self, size: Option<Size>) {
        self.size.set(size);
    }
}

impl ObservedElement for MockElement {
    fn measure(&self) -> Option<Size> {
        self.size.get()
    }
}

type SharedCallback<E> = Rc<dyn Fn(&[ResizeRecord<E>])>;

struct ResizeState<E: ?Sized> {
    callback: RefCell<Option<SharedCallback<E>>>,
    observed: RefCell<Vec<Weak<E>>>,
    created: Cell<usize>,
}

impl<E: ?Sized> ResizeState<E> {
    fn position(&self, element: &Rc<E>) -> Option<usize> {
        self.observed
            .borrow()
            .iter()
            .position(|w| core::ptr::addr_eq(w.as_ptr(), Rc::as_ptr(element)))
    }
}

/// An in-memory size observation host.
///
/// Records are only delivered for elements the observer is currently watching.
pub struct MockResizeEnvironment<E: ?Sized> {
    state: Rc<ResizeState<E>>,
}

impl<E: ?Sized> Clone for MockResizeEnvironment<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<E: ?Sized> Default for MockResizeEnvironment<E> {
    fn default() -> Self {
        Self {
            state: Rc::new(ResizeState {
                callback: RefCell::new(None),
                observed: RefCell::new(Vec::new()),
                created: Cell::new(0),
            }),
        }
    }
}

impl<E: ?Sized> fmt::Debug for MockResizeEnvironment<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockResizeEnvironment")
            .field("observers_created", &self.state.created.get())
            .field("observed", &self.state.observed.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<E: ?Sized + 'static> MockResizeEnvironment<E> {
    /// An environment with no observer yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `element` at `size` through the box size field.
    pub fn resize(&self, element: &Rc<E>, size: Size) {
        self.deliver_if_observed(ResizeRecord {
            target: element.clone(),
            content_box_size: Some(BoxSize {
                inline_size: size.width,
                block_size: size.height,
            }),
            content_rect: size.to_rect(),
        });
    }

    /// Report `element` through the content rectangle only.
    pub fn resize_content_rect(&self, element: &Rc<E>, rect: Rect) {
        self.deliver_if_observed(ResizeRecord {
            target: element.clone(),
            content_box_size: None,
            content_rect: rect,
        });
    }

    fn deliver_if_observed(&self, record: ResizeRecord<E>) {
        if self.is_observing(&record.target) {
            self.deliver(&[record]);
        }
    }

    /// Hand `records` to the observer callback as one batch, observed or not.
    pub fn deliver(&self, records: &[ResizeRecord<E>]) {
        let callback = self.state.callback.borrow().clone();
        if let Some(callback) = callback {
            callback(records);
        }
    }

    /// Whether `element` is currently observed.
    pub fn is_observing(&self, element: &Rc<E>) -> bool {
        self.state.position(element).is_some()
    }

    /// Number of elements currently observed.
    pub fn observed_count(&self) -> usize {
        self.state.observed.borrow().len()
    }

    /// Number of observers created through this environment.
    pub fn observers_created(&self) -> usize {
        self.state.created.get()
    }
}

struct MockObserver<E: ?Sized> {
    state: Rc<ResizeState<E>>,
}

impl<E: ?Sized> SizeObserver<E> for MockObserver<E> {
    fn observe(&self, element: &Rc<E>) {
        if self.state.position(element).is_none() {
            self.state
                .observed
                .borrow_mut()
                .push(Rc::downgrade(element));
        }
    }

    fn unobserve(&self, element: &Rc<E>) {
        if let Some(i) = self.state.position(element) {
            self.state.observed.borrow_mut().swap_remove(i);
        }
    }
}

impl<E: ?Sized + 'static> SizeEnvironment<E> for MockResizeEnvironment<E> {
    fn create_observer(&self, on_records: RecordsCallback<E>) -> Option<Box<dyn SizeObserver<E>>> {
        self.state.created.set(self.state.created.get() + 1);
        *self.state.callback.borrow_mut() = Some(Rc::from(on_records));
        Some(Box::new(MockObserver {
            state: self.state.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parsing() {
        assert_eq!(
            parse_descriptor("(min-width: 640.02px) and (max-width: 767.98px)"),
            Some(Bounds {
                min: Some(640.02),
                max: Some(767.98)
            })
        );
        assert_eq!(
            parse_descriptor("all"),
            Some(Bounds {
                min: None,
                max: None
            })
        );
        assert_eq!(parse_descriptor("not all"), None);
        assert_eq!(parse_descriptor("(orientation: portrait)"), None);
    }

    #[test]
    fn set_width_fires_only_on_flip() {
        let viewport = MockViewport::new(500.0);
        let source = viewport
            .match_query("(min-width: 768px)")
            .expect("interactive viewport");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let listener: Listener = Rc::new(move || h.set(h.get() + 1));
        source.add_change_listener(&listener).unwrap();
        viewport.set_width(600.0);
        assert_eq!(hits.get(), 0);
        viewport.set_width(800.0);
        viewport.set_width(900.0);
        assert_eq!(hits.get(), 1);
        assert!(source.matches());
    }

    #[test]
    fn non_interactive_creates_nothing() {
        let viewport = MockViewport::new(500.0).non_interactive();
        assert!(viewport.match_query("all").is_none());
        assert_eq!(viewport.query_count(), 0);
    }
}
