//! The engine capability seam
//!
//! Everything above this module is engine-agnostic: documents, pages and
//! text layers are reached through the traits below. Two engines ship with
//! the crate:
//!
//! - [`memory::MemoryBackend`]: an in-memory engine built from plain page
//!   descriptions, always available.
//! - `pdfium::PdfiumBackend`: the native PDFium engine, behind the `pdfium`
//!   cargo feature.
//!
//! Resource release is tied to `Drop`: dropping a [`PageBackend`] value
//! closes the page handle, dropping a [`TextLayerBackend`] value closes the
//! text handle. Callers must drop a text layer before the page it came from.

pub mod memory;
#[cfg(feature = "pdfium")]
pub mod pdfium;

use crate::destination::Destination;
use crate::document::PageMode;
use crate::error::Result;
use crate::geometry::{DeviceTransform, PageRect, PageSize, Rotation};
use crate::render::{ClipRect, Matrix, PageImage, RenderFlags};
use std::path::Path;

/// A PDF engine.
pub trait Backend: Send + Sync {
    type Document: DocumentBackend;

    /// Process-wide engine setup. Called by the first live `LibraryGuard`.
    fn init_library(&self);

    /// Process-wide engine teardown. Called when the last `LibraryGuard` drops.
    fn destroy_library(&self);

    /// Open a document.
    ///
    /// A missing or wrong password is reported as `PdfError::InvalidPassword`.
    fn load_document(&self, path: &Path, password: Option<&str>) -> Result<Self::Document>;
}

/// An open document handle. Dropping it closes the document.
pub trait DocumentBackend: Send + Sync {
    type Page: PageBackend;
    type Bookmark;

    fn page_count(&self) -> usize;

    fn page_mode(&self) -> PageMode;

    /// Information dictionary entry (`Title`, `Author`, `CreationDate`, ...).
    fn meta_text(&self, key: &str) -> Option<String>;

    /// Page size in points, answered without loading the page.
    fn page_size(&self, index: usize) -> Option<PageSize>;

    /// Page label, answered without loading the page.
    fn page_label(&self, index: usize) -> Option<String>;

    /// Load a page handle. `None` for corrupt or out-of-range pages.
    fn load_page(&self, index: usize) -> Option<Self::Page>;

    /// Look up a destination from the document's name tree.
    fn named_destination(&self, name: &str) -> Option<Destination>;

    /// First child of `parent`, or the first root bookmark for `None`.
    fn first_child(&self, parent: Option<&Self::Bookmark>) -> Option<Self::Bookmark>;

    fn next_sibling(&self, bookmark: &Self::Bookmark) -> Option<Self::Bookmark>;

    fn bookmark_title(&self, bookmark: &Self::Bookmark) -> String;

    fn bookmark_destination(&self, bookmark: &Self::Bookmark) -> Option<Destination>;
}

/// A live page handle. Dropping it closes the page.
pub trait PageBackend: DeviceTransform + Send {
    type TextLayer: TextLayerBackend;

    /// The page's own `/Rotate` value.
    fn rotation(&self) -> Rotation;

    /// Load the text layer. `None` when the engine cannot build one.
    fn load_text_layer(&self) -> Option<Self::TextLayer>;

    /// Rasterize the whole page into `target`, scaled to its dimensions.
    /// Returns `false` when the engine could not render.
    fn render(&self, target: &mut PageImage, flags: RenderFlags) -> bool;

    /// Rasterize through an explicit page-to-bitmap matrix.
    fn render_with_matrix(
        &self,
        target: &mut PageImage,
        matrix: &Matrix,
        clip: &ClipRect,
        flags: RenderFlags,
    ) -> bool;

    /// Whether at least one link annotation enumerates.
    fn has_links(&self) -> bool;

    /// Every link annotation, in the engine's enumeration order.
    fn link_annotations(&self) -> Vec<LinkAnnotation>;
}

/// A live text layer handle. Dropping it closes the text layer.
pub trait TextLayerBackend: Send {
    fn char_count(&self) -> usize;

    /// Number of line/word rectangles covering all characters.
    fn rect_count(&self) -> usize;

    /// Unicode code point of character `index`.
    fn unicode(&self, index: usize) -> u32;

    /// Tight glyph box in page space.
    fn char_box(&self, index: usize) -> Option<PageRect>;

    /// Glyph box including inter-character spacing, in page space.
    fn loose_char_box(&self, index: usize) -> Option<PageRect>;

    /// Line/word rectangle `index` in page space.
    fn rect(&self, index: usize) -> Option<PageRect>;
}

/// A link annotation as the engine reports it, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkAnnotation {
    /// Destination of a go-to link
    pub destination: Option<Destination>,
    /// URI action path, undecoded (7-bit ASCII / Latin-1 bytes)
    pub uri: Option<Vec<u8>>,
    /// Annotation rectangle in page space
    pub rect: Option<PageRect>,
}
