//! Link extraction
//!
//! Converts the engine's raw link annotations into clickable regions in
//! normalized page coordinates, each pointing either at a page of the same
//! document or at an external URI. Records that resolve to neither, or that
//! carry no rectangle, are dropped.

use crate::backend::{DocumentBackend, LinkAnnotation};
use crate::destination::{resolve_viewport, Viewport};
use crate::geometry::{page_rect_to_device, DeviceTransform, DeviceViewport, NormalizedRect};
use serde::Serialize;
use tracing::trace;

/// Where a link goes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkTarget {
    /// A page of the same document
    Internal { viewport: Viewport },
    /// An external resource
    External { uri: String },
}

/// A clickable region on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    /// Clickable area, relative to the page size
    pub rect: NormalizedRect,
    pub target: LinkTarget,
}

impl PageLink {
    /// Internal links resolve to a page index.
    pub fn page(&self) -> Option<usize> {
        match &self.target {
            LinkTarget::Internal { viewport } => Some(viewport.page),
            LinkTarget::External { .. } => None,
        }
    }

    /// External links resolve to a URI.
    pub fn uri(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::External { uri } => Some(uri),
            LinkTarget::Internal { .. } => None,
        }
    }
}

/// Decode a URI action path: 7-bit ASCII in practice, read as Latin-1 up to
/// the first NUL.
pub fn decode_uri(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// Resolve one annotation. `None` drops the record.
fn resolve_link<D, P>(doc: &D, page: &P, viewport: &DeviceViewport, annot: &LinkAnnotation) -> Option<PageLink>
where
    D: DocumentBackend + ?Sized,
    P: DeviceTransform + ?Sized,
{
    let rect = annot.rect?;

    let target = annot
        .destination
        .as_ref()
        .and_then(|dest| resolve_viewport(doc, dest))
        .map(|viewport| LinkTarget::Internal { viewport })
        .or_else(|| {
            let uri = decode_uri(annot.uri.as_deref()?);
            (!uri.is_empty()).then_some(LinkTarget::External { uri })
        })?;

    let device = page_rect_to_device(page, viewport, &rect)?;
    let rect = NormalizedRect::from_pixel_rect(&device, f64::from(viewport.size_x), f64::from(viewport.size_y));
    Some(PageLink { rect, target })
}

/// Resolve every annotation of a page, preserving enumeration order.
///
/// `viewport` is the page's unit viewport; link rectangles are normalized
/// against its size.
pub fn extract_links<D, P>(doc: &D, page: &P, viewport: &DeviceViewport, annotations: &[LinkAnnotation]) -> Vec<PageLink>
where
    D: DocumentBackend + ?Sized,
    P: DeviceTransform + ?Sized,
{
    annotations
        .iter()
        .enumerate()
        .filter_map(|(position, annot)| {
            let link = resolve_link(doc, page, viewport, annot);
            if link.is_none() {
                trace!(position, "dropping unresolvable link annotation");
            }
            link
        })
        .collect()
}
