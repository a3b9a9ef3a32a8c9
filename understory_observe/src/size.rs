// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element size observation primitives.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use kurbo::{Rect, Size};

use crate::query::NoViewport;

/// An element whose box can be measured and observed.
pub trait ObservedElement {
    /// Current geometry, or `None` if it cannot be read.
    fn measure(&self) -> Option<Size>;
}

/// Logical box dimensions reported by a size observer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxSize {
    /// Extent along the inline axis (width in horizontal writing modes).
    pub inline_size: f64,
    /// Extent along the block axis.
    pub block_size: f64,
}

/// One element's change in a batch delivered by a [`SizeObserver`].
pub struct ResizeRecord<E: ?Sized> {
    /// The observed element.
    pub target: Rc<E>,
    /// Content box size, when the host reports it.
    pub content_box_size: Option<BoxSize>,
    /// Content rectangle; used when `content_box_size` is absent.
    pub content_rect: Rect,
}

impl<E: ?Sized> ResizeRecord<E> {
    /// The record's size, preferring the box size over the content rectangle.
    pub fn size(&self) -> Size {
        match self.content_box_size {
            Some(b) => Size::new(b.inline_size, b.block_size),
            None => self.content_rect.size(),
        }
    }
}

impl<E: ?Sized> Clone for ResizeRecord<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            content_box_size: self.content_box_size,
            content_rect: self.content_rect,
        }
    }
}

impl<E: ?Sized> fmt::Debug for ResizeRecord<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeRecord")
            .field("target", &Rc::as_ptr(&self.target).cast::<()>())
            .field("content_box_size", &self.content_box_size)
            .field("content_rect", &self.content_rect)
            .finish()
    }
}

/// Callback a size observer invokes with each batch of records.
pub type RecordsCallback<E> = Box<dyn Fn(&[ResizeRecord<E>])>;

/// A single native observer that can watch many elements.
pub trait SizeObserver<E: ?Sized> {
    /// Start delivering records for `element`.
    fn observe(&self, element: &Rc<E>);
    /// Stop delivering records for `element`.
    fn unobserve(&self, element: &Rc<E>);
}

/// Creates the native size observer.
pub trait SizeEnvironment<E: ?Sized> {
    /// Create an observer that reports batches to `on_records`, or `None` if the host
    /// has no size observation (for example on a server).
    fn create_observer(&self, on_records: RecordsCallback<E>) -> Option<Box<dyn SizeObserver<E>>>;
}

impl<T: SizeEnvironment<E> + ?Sized, E: ?Sized> SizeEnvironment<E> for Rc<T> {
    fn create_observer(&self, on_records: RecordsCallback<E>) -> Option<Box<dyn SizeObserver<E>>> {
        (**self).create_observer(on_records)
    }
}

impl<E: ?Sized> SizeEnvironment<E> for NoViewport {
    fn create_observer(
        &self,
        _on_records: RecordsCallback<E>,
    ) -> Option<Box<dyn SizeObserver<E>>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockElement;

    #[test]
    fn box_size_preferred_over_content_rect() {
        let el = Rc::new(MockElement::new(Size::ZERO));
        let mut record = ResizeRecord {
            target: el,
            content_box_size: Some(BoxSize {
                inline_size: 320.0,
                block_size: 200.0,
            }),
            content_rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert_eq!(record.size(), Size::new(320.0, 200.0));
        record.content_box_size = None;
        assert_eq!(record.size(), Size::new(10.0, 10.0));
    }
}
