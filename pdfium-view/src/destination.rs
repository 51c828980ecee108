//! PDF destination support
//!
//! A [`Destination`] is what the engine reports for a link, a bookmark or a
//! named destination: a page index and an optional location on that page.
//! A [`Viewport`] is the validated, host-facing form of it, with the
//! location normalized against the size of the *target* page.

use crate::backend::DocumentBackend;
use crate::geometry::{NormalizedPoint, PagePoint};
use serde::Serialize;

/// A navigation target as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Destination {
    /// Target page index (0-based), `None` when unresolvable
    pub page_index: Option<usize>,
    /// Explicit location in the target page's space; present only when the
    /// destination carries both an x and a y coordinate
    pub location: Option<PagePoint>,
}

impl Destination {
    /// Destination to a whole page.
    pub fn page(index: usize) -> Self {
        Self {
            page_index: Some(index),
            location: None,
        }
    }

    /// Destination to a point on a page.
    pub fn at(index: usize, x: f64, y: f64) -> Self {
        Self {
            page_index: Some(index),
            location: Some(PagePoint::new(x, y)),
        }
    }
}

/// Where a viewer should navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Target page (0-based)
    pub page: usize,
    /// Top-left anchored scroll position; `None` means the whole page
    pub position: Option<NormalizedPoint>,
}

impl Viewport {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            position: None,
        }
    }
}

/// Validate a destination against the document and normalize its location.
///
/// Returns `None` unless the page index is in `[0, page_count)`. A location
/// is normalized against the target page's size; when that size is unknown
/// or degenerate the viewport falls back to whole-page navigation.
pub fn resolve_viewport<D>(doc: &D, destination: &Destination) -> Option<Viewport>
where
    D: DocumentBackend + ?Sized,
{
    let page = destination.page_index?;
    if page >= doc.page_count() {
        return None;
    }

    let position = destination.location.and_then(|point| {
        let size = doc.page_size(page)?;
        if size.is_empty() {
            return None;
        }
        Some(NormalizedPoint::new(
            point.x / size.width,
            (size.height - point.y) / size.height,
        ))
    });

    Some(Viewport { page, position })
}
