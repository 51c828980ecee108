//! Document adapter
//!
//! A [`Document`] owns the engine's document handle. Pages borrow it, so the
//! document cannot be closed or re-unlocked while any [`Page`] is alive.
//!
//! # Example
//!
//! ```
//! use pdfium_view::backend::memory::{MemoryBackend, MemoryDocument, MemoryPage};
//! use pdfium_view::{Document, PageSize};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new().with_document(
//!     "report.pdf",
//!     MemoryDocument::new().with_page(MemoryPage::new(PageSize::new(612.0, 792.0))),
//! ));
//! let doc = Document::load(backend, "report.pdf", None)?;
//! assert_eq!(doc.page_count(), 1);
//! let page = doc.page(0)?;
//! assert!(page.characters().is_empty());
//! # Ok::<(), pdfium_view::PdfError>(())
//! ```

use crate::backend::{Backend, DocumentBackend};
use crate::bookmark::Synopsis;
use crate::date::parse_pdf_date;
use crate::destination::{resolve_viewport, Viewport};
use crate::error::{PdfError, Result};
use crate::geometry::PageSize;
use crate::page::Page;
use crate::render::RenderConfig;
use crate::text_layout::CharEntity;
use chrono::{DateTime, FixedOffset};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// The initial page mode to use when opening the document.
///
/// This specifies how the document should be displayed when first opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PageMode {
    /// Document outline and thumbnails are hidden.
    #[default]
    UseNone,
    /// Document outline (bookmarks) is visible.
    UseOutlines,
    /// Thumbnail images are visible.
    UseThumbs,
    /// Full-screen mode, no menu bar, window controls, or other decorations visible.
    FullScreen,
    /// Optional content group panel is visible.
    UseOC,
    /// Attachments panel is visible.
    UseAttachments,
    /// Unknown page mode.
    Unknown(i32),
}

impl PageMode {
    /// Convert from raw PDFium value.
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => PageMode::UseNone,
            1 => PageMode::UseOutlines,
            2 => PageMode::UseThumbs,
            3 => PageMode::FullScreen,
            4 => PageMode::UseOC,
            5 => PageMode::UseAttachments,
            other => PageMode::Unknown(other),
        }
    }
}

/// Standard document properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
    pub pages: usize,
    pub mime_type: &'static str,
}

/// An opened (possibly still locked) PDF document.
pub struct Document<B: Backend> {
    backend: Arc<B>,
    path: PathBuf,
    handle: Option<B::Document>,
    render_config: RenderConfig,
    synopsis: OnceLock<Synopsis>,
}

impl<B: Backend> Document<B> {
    /// Open `path`.
    ///
    /// A document that needs a password it was not given (or was given the
    /// wrong one) opens in the locked state; see [`Document::unlock`]. Every
    /// other failure is an error.
    pub fn load<P: AsRef<Path>>(backend: Arc<B>, path: P, password: Option<&str>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let handle = match backend.load_document(&path, password) {
            Ok(handle) => Some(handle),
            Err(PdfError::InvalidPassword) => {
                info!(path = %path.display(), "document is encrypted; opened locked");
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(handle) = &handle {
            debug!(path = %path.display(), pages = handle.page_count(), "opened document");
        }
        Ok(Self {
            backend,
            path,
            handle,
            render_config: RenderConfig::default(),
            synopsis: OnceLock::new(),
        })
    }

    /// Use `config` for pages created from now on.
    pub fn set_render_config(&mut self, config: RenderConfig) {
        self.render_config = config;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True while the password has not been supplied.
    pub fn is_locked(&self) -> bool {
        self.handle.is_none()
    }

    /// Retry opening with `password`. Returns whether the document is now
    /// unlocked; a wrong password leaves it locked.
    pub fn unlock(&mut self, password: &str) -> bool {
        if self.handle.is_some() {
            return true;
        }
        match self.backend.load_document(&self.path, Some(password)) {
            Ok(handle) => {
                debug!(path = %self.path.display(), "document unlocked");
                self.handle = Some(handle);
                self.synopsis = OnceLock::new();
                true
            }
            Err(PdfError::InvalidPassword) => false,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unlock failed");
                false
            }
        }
    }

    /// The engine handle, once unlocked.
    pub fn handle(&self) -> Result<&B::Document> {
        self.handle.as_ref().ok_or(PdfError::DocumentLocked)
    }

    /// Number of pages; 0 while locked.
    pub fn page_count(&self) -> usize {
        self.handle.as_ref().map_or(0, |handle| handle.page_count())
    }

    pub fn page_mode(&self) -> PageMode {
        self.handle
            .as_ref()
            .map(|handle| handle.page_mode())
            .unwrap_or_default()
    }

    /// Information dictionary entry, e.g. `"Title"` or `"CreationDate"`.
    pub fn meta_text(&self, key: &str) -> Option<String> {
        self.handle.as_ref()?.meta_text(key)
    }

    pub fn page_size(&self, index: usize) -> Option<PageSize> {
        self.handle.as_ref()?.page_size(index)
    }

    pub fn page_label(&self, index: usize) -> Option<String> {
        self.handle.as_ref()?.page_label(index)
    }

    /// Create the resource manager for page `index`. Nothing is loaded
    /// until the page is queried.
    pub fn page(&self, index: usize) -> Result<Page<'_, B::Document>> {
        let handle = self.handle()?;
        let count = handle.page_count();
        if index >= count {
            return Err(PdfError::PageIndexOutOfBounds { index, count });
        }
        Ok(Page::new(handle, index, self.render_config.clone()))
    }

    /// The outline tree, built on first call. Empty while locked.
    pub fn synopsis(&self) -> &Synopsis {
        self.synopsis.get_or_init(|| match &self.handle {
            Some(handle) => Synopsis::build(handle),
            None => Synopsis::default(),
        })
    }

    /// Resolve a named destination.
    pub fn named_viewport(&self, name: &str) -> Option<Viewport> {
        if name.is_empty() {
            return None;
        }
        let handle = self.handle.as_ref()?;
        let destination = handle.named_destination(name)?;
        resolve_viewport(handle, &destination)
    }

    /// Standard properties, with dates parsed from the PDF date format.
    pub fn document_info(&self) -> DocumentInfo {
        let date = |key: &str| self.meta_text(key).and_then(|text| parse_pdf_date(&text));
        DocumentInfo {
            title: self.meta_text("Title"),
            subject: self.meta_text("Subject"),
            author: self.meta_text("Author"),
            keywords: self.meta_text("Keywords"),
            creator: self.meta_text("Creator"),
            producer: self.meta_text("Producer"),
            creation_date: date("CreationDate"),
            modification_date: date("ModDate"),
            pages: self.page_count(),
            mime_type: "application/pdf",
        }
    }

    /// Whether the document asks to be shown full screen.
    pub fn start_full_screen(&self) -> bool {
        self.page_mode() == PageMode::FullScreen
    }

    /// Whether the document asks for its outline to be shown.
    pub fn open_toc(&self) -> bool {
        self.page_mode() == PageMode::UseOutlines
    }

    /// Reconstruct the characters of several pages in parallel.
    ///
    /// Each page gets its own short-lived manager. Out-of-range indices yield
    /// an empty list.
    pub fn par_characters(&self, indices: &[usize]) -> Vec<(usize, Arc<[CharEntity]>)> {
        indices
            .par_iter()
            .map(|&index| {
                let characters = match self.page(index) {
                    Ok(page) => page.characters(),
                    Err(_) => Arc::from(Vec::new()),
                };
                (index, characters)
            })
            .collect()
    }

    /// Close the engine handle now. Consumes the document; pages borrow it,
    /// so none can outlive this call.
    pub fn close(mut self) {
        let handle = self.handle.take();
        debug!(path = %self.path.display(), locked = handle.is_none(), "closing document");
        drop(handle);
    }
}

impl<B: Backend> std::fmt::Debug for Document<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{BackendEvent, MemoryBackend, MemoryDocument, MemoryPage};
    use crate::destination::Destination;
    use chrono::Datelike;

    fn sample() -> MemoryDocument {
        MemoryDocument::new()
            .with_page(MemoryPage::new(PageSize::new(612.0, 792.0)).with_label("i"))
            .with_page(
                MemoryPage::new(PageSize::new(612.0, 792.0))
                    .with_text_line("Hi", 72.0, 720.0, 10.0, 12.0),
            )
            .with_meta("Title", "Quarterly Report")
            .with_meta("Author", "Finance")
            .with_meta("CreationDate", "D:20190612093015+05'30'")
            .with_meta("ModDate", "garbage")
            .with_named_destination("summary", Destination::at(1, 0.0, 792.0))
    }

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(
            MemoryBackend::new()
                .with_document("sample.pdf", sample())
                .with_document("secret.pdf", sample().with_password("hunter2")),
        )
    }

    #[test]
    fn test_load_and_query() {
        let doc = Document::load(backend(), "sample.pdf", None).unwrap();
        assert!(!doc.is_locked());
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_label(0).as_deref(), Some("i"));
        assert_eq!(doc.page_size(1), Some(PageSize::new(612.0, 792.0)));
        assert_eq!(doc.meta_text("Title").as_deref(), Some("Quarterly Report"));
        assert!(doc.meta_text("Subject").is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Document::load(backend(), "nope.pdf", None).unwrap_err();
        assert!(matches!(err, PdfError::FileNotFound(_)));
    }

    #[test]
    fn test_locked_document_unlock_flow() {
        let mut doc = Document::load(backend(), "secret.pdf", None).unwrap();
        assert!(doc.is_locked());
        assert_eq!(doc.page_count(), 0);
        assert!(matches!(doc.page(0), Err(PdfError::DocumentLocked)));
        assert!(doc.synopsis().is_empty());

        assert!(!doc.unlock("wrong"));
        assert!(doc.is_locked());

        assert!(doc.unlock("hunter2"));
        assert!(!doc.is_locked());
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page(1).unwrap().char_count(), 2);
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = Document::load(backend(), "sample.pdf", None).unwrap();
        assert!(matches!(
            doc.page(2),
            Err(PdfError::PageIndexOutOfBounds { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_document_info() {
        let doc = Document::load(backend(), "sample.pdf", None).unwrap();
        let info = doc.document_info();
        assert_eq!(info.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(info.author.as_deref(), Some("Finance"));
        assert_eq!(info.creation_date.map(|d| d.year()), Some(2019));
        assert!(info.modification_date.is_none());
        assert_eq!(info.pages, 2);
        assert_eq!(info.mime_type, "application/pdf");
    }

    #[test]
    fn test_named_viewport() {
        let doc = Document::load(backend(), "sample.pdf", None).unwrap();
        let viewport = doc.named_viewport("summary").unwrap();
        assert_eq!(viewport.page, 1);
        let position = viewport.position.unwrap();
        assert_eq!((position.x, position.y), (0.0, 0.0));
        assert!(doc.named_viewport("missing").is_none());
        assert!(doc.named_viewport("").is_none());
    }

    #[test]
    fn test_page_modes() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_document("fs.pdf", MemoryDocument::new().with_page_mode(PageMode::FullScreen))
                .with_document("toc.pdf", MemoryDocument::new().with_page_mode(PageMode::UseOutlines)),
        );
        let fs = Document::load(Arc::clone(&backend), "fs.pdf", None).unwrap();
        assert!(fs.start_full_screen());
        assert!(!fs.open_toc());
        let toc = Document::load(backend, "toc.pdf", None).unwrap();
        assert!(toc.open_toc());
        assert_eq!(PageMode::from_raw(-1), PageMode::Unknown(-1));
        assert_eq!(PageMode::from_raw(3), PageMode::FullScreen);
    }

    #[test]
    fn test_par_characters() {
        let doc = Document::load(backend(), "sample.pdf", None).unwrap();
        let mut results = doc.par_characters(&[0, 1, 5]);
        results.sort_by_key(|(index, _)| *index);
        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_empty());
        assert_eq!(results[1].1.len(), 2);
        assert!(results[2].1.is_empty());
    }

    #[test]
    fn test_close_releases_handle() {
        let backend = backend();
        let stats = backend.stats();
        let doc = Document::load(Arc::clone(&backend), "sample.pdf", None).unwrap();
        {
            let page = doc.page(0).unwrap();
            page.orientation();
            assert!(page.is_loaded());
        }
        doc.close();
        let events = stats.events();
        let closed: Vec<_> = events
            .iter()
            .filter(|event| **event == BackendEvent::DocumentClosed)
            .collect();
        assert_eq!(closed.len(), 1);
        assert_eq!(
            &events[events.len() - 3..],
            &[
                BackendEvent::PageLoaded(0),
                BackendEvent::PageClosed(0),
                BackendEvent::DocumentClosed
            ]
        );
    }

    #[test]
    fn test_close_locked_document_has_nothing_to_release() {
        let backend = backend();
        let stats = backend.stats();
        let doc = Document::load(Arc::clone(&backend), "secret.pdf", None).unwrap();
        assert!(doc.is_locked());
        doc.close();
        assert!(!stats.events().contains(&BackendEvent::DocumentClosed));
    }
}
