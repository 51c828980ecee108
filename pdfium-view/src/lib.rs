//! # pdfium-view
//!
//! Per-page PDF adapter for document viewers.
//!
//! The crate sits between a viewer host and a PDF engine and keeps the
//! engine's per-page resources in check:
//!
//! - **Lazy handles**: page and text-layer handles are loaded on first use
//!   and released when the page closes
//! - **Cached derivations**: the last rendered image, the character boxes and
//!   the links of a page are computed once
//! - **Text layout**: per-character device rectangles, repaired for zero-size
//!   glyphs, control characters and overlaps
//! - **Navigation**: links, named destinations and the outline resolve to
//!   page indices plus normalized positions
//!
//! ## Quick Start
//!
//! ```
//! use pdfium_view::backend::memory::{MemoryBackend, MemoryDocument, MemoryPage};
//! use pdfium_view::{PageSize, PixmapRequest, Session, SessionConfig};
//! use std::sync::Arc;
//!
//! let page = MemoryPage::new(PageSize::new(612.0, 792.0))
//!     .with_text_line("Hello", 72.0, 720.0, 8.0, 12.0);
//! let backend = Arc::new(
//!     MemoryBackend::new().with_document("hello.pdf", MemoryDocument::new().with_page(page)),
//! );
//!
//! let mut session = Session::new(backend, SessionConfig::new().set_dpi(96.0, 96.0));
//! assert!(session.load_document("hello.pdf", None).is_success());
//!
//! let text = session.text_page(0).unwrap();
//! assert_eq!(text.text(), "Hello");
//!
//! let image = session.image(&PixmapRequest::new(0, 306, 396), || false);
//! assert_eq!(image.size(), (306, 396));
//! ```
//!
//! With the `pdfium` feature, `backend::pdfium::PdfiumBackend` drives the
//! native library instead of the in-memory engine.

pub mod backend;
mod bookmark;
mod date;
mod destination;
mod document;
mod error;
mod geometry;
mod library;
mod link;
mod page;
mod render;
mod session;
mod text_layout;

pub use backend::{Backend, DocumentBackend, LinkAnnotation, PageBackend, TextLayerBackend};
pub use bookmark::{Synopsis, SynopsisEntry};
pub use date::parse_pdf_date;
pub use destination::{resolve_viewport, Destination, Viewport};
pub use document::{Document, DocumentInfo, PageMode};
pub use error::{PdfError, Result};
pub use geometry::{
    device_rect_to_page, page_rect_to_device, DeviceTransform, DeviceViewport,
    NormalizedPoint, NormalizedRect, PagePoint, PageRect, PageSize, PixelRect, Rotation,
};
pub use library::{active_count, LibraryGuard};
pub use link::{decode_uri, extract_links, LinkTarget, PageLink};
pub use page::Page;
pub use render::{ClipRect, Matrix, PageImage, PixelFormat, RenderConfig, RenderFlags};
pub use session::{
    MetaDataKey, MetaDataValue, OpenResult, PageLayout, PixmapRequest, Session, SessionConfig, TextEntity,
    TextPage,
};
pub use text_layout::{reconstruct, CharEntity, ZERO_SIZE_TOLERANCE};
