//! Viewer session
//!
//! A [`Session`] is what a viewer host talks to: it keeps the engine library
//! alive, holds at most one open document, lays pages out at the display DPI
//! and answers pixmap, text and metadata requests.

use crate::backend::Backend;
use crate::bookmark::Synopsis;
use crate::destination::Viewport;
use crate::document::{Document, DocumentInfo};
use crate::error::PdfError;
use crate::geometry::{NormalizedRect, Rotation};
use crate::library::LibraryGuard;
use crate::link::PageLink;
use crate::render::{PageImage, RenderConfig};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for a viewer session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    dpi_x: f64,
    dpi_y: f64,
    render_config: RenderConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dpi_x: 72.0,
            dpi_y: 72.0,
            render_config: RenderConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display resolution.
    ///
    /// Default: 72 x 72 (one pixel per point)
    pub fn set_dpi(mut self, dpi_x: f64, dpi_y: f64) -> Self {
        self.dpi_x = dpi_x;
        self.dpi_y = dpi_y;
        self
    }

    /// Set the render configuration used for every page.
    pub fn set_render_config(mut self, config: RenderConfig) -> Self {
        self.render_config = config;
        self
    }

    pub fn dpi(&self) -> (f64, f64) {
        (self.dpi_x, self.dpi_y)
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }
}

/// Outcome of [`Session::load_document`].
#[derive(Debug)]
pub enum OpenResult {
    Success,
    /// The document is encrypted and no valid password was given
    NeedsPassword,
    Error(PdfError),
}

impl OpenResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OpenResult::Success)
    }
}

/// Page placement at the session DPI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub number: usize,
    /// Width in pixels at the session DPI
    pub width: f64,
    /// Height in pixels at the session DPI
    pub height: f64,
    pub orientation: Rotation,
    pub label: String,
}

/// A request for page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixmapRequest {
    pub page: usize,
    /// Width of the full page raster the host wants
    pub width: u32,
    /// Height of the full page raster the host wants
    pub height: u32,
    /// Only this part of the raster, when set
    pub tile: Option<NormalizedRect>,
}

impl PixmapRequest {
    pub fn new(page: usize, width: u32, height: u32) -> Self {
        Self {
            page,
            width,
            height,
            tile: None,
        }
    }

    pub fn with_tile(mut self, tile: NormalizedRect) -> Self {
        self.tile = Some(tile);
        self
    }
}

/// One character with its box relative to the page size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextEntity {
    pub text: char,
    pub rect: NormalizedRect,
}

/// Text of a page, plus the one-time extras of the first request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPage {
    pub page: usize,
    pub entities: Vec<TextEntity>,
    /// Page links, reported with the first text request of a page that has any
    pub links: Option<Vec<PageLink>>,
    /// New layout, when the first text request found the page rotated
    /// differently from its layout
    pub relayout: Option<PageLayout>,
}

impl TextPage {
    pub fn text(&self) -> String {
        self.entities.iter().map(|e| e.text).collect()
    }
}

/// Metadata a host may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaDataKey<'a> {
    StartFullScreen,
    NamedViewport(&'a str),
    DocumentTitle,
    OpenToc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaDataValue {
    Flag(bool),
    Viewport(Viewport),
    Text(String),
}

/// A viewer session over one engine.
pub struct Session<B: Backend> {
    // Declared before the guard: the document closes before the library
    // can be torn down.
    document: Option<Document<B>>,
    layouts: Vec<PageLayout>,
    /// Pages whose first text request has been served
    text_served: Vec<bool>,
    config: SessionConfig,
    library: LibraryGuard<B>,
}

impl<B: Backend> Session<B> {
    /// Start a session, initializing the engine library if needed.
    pub fn new(backend: Arc<B>, config: SessionConfig) -> Self {
        Self {
            document: None,
            layouts: Vec::new(),
            text_served: Vec::new(),
            config,
            library: LibraryGuard::acquire(backend),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open `path`. Fails without side effects when a document is already open.
    pub fn load_document<P: AsRef<Path>>(&mut self, path: P, password: Option<&str>) -> OpenResult {
        let path = path.as_ref();
        if self.document.is_some() {
            warn!(path = %path.display(), "document already loaded; close it first");
            return OpenResult::Error(PdfError::AlreadyLoaded);
        }

        let mut document = match Document::load(Arc::clone(self.library.backend()), path, password) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open document");
                return OpenResult::Error(e);
            }
        };
        if document.is_locked() {
            info!(path = %path.display(), "document needs a password");
            return OpenResult::NeedsPassword;
        }
        document.set_render_config(self.config.render_config.clone());

        let count = document.page_count();
        let layouts: Vec<PageLayout> = (0..count)
            .map(|index| self.layout(&document, index, Rotation::None))
            .collect();
        self.layouts = layouts;
        self.text_served = vec![false; count];
        self.document = Some(document);
        debug!(path = %path.display(), pages = count, "session document loaded");
        OpenResult::Success
    }

    fn layout(&self, document: &Document<B>, index: usize, orientation: Rotation) -> PageLayout {
        let size = document.page_size(index).unwrap_or_default();
        let (width, height) = size.at_dpi(self.config.dpi_x, self.config.dpi_y);
        PageLayout {
            number: index,
            width,
            height,
            orientation,
            label: document.page_label(index).unwrap_or_default(),
        }
    }

    /// Close the open document, if any.
    pub fn close_document(&mut self) {
        if let Some(document) = self.document.take() {
            document.close();
        }
        self.layouts.clear();
        self.text_served.clear();
    }

    pub fn document(&self) -> Option<&Document<B>> {
        self.document.as_ref()
    }

    pub fn page_layouts(&self) -> &[PageLayout] {
        &self.layouts
    }

    /// Render the pixels of `request`.
    ///
    /// The page is rendered at the resolution that makes its layout size
    /// match the requested size. `should_abort` is consulted once, right
    /// before rendering starts. Any failure yields an empty image.
    pub fn image<F>(&self, request: &PixmapRequest, should_abort: F) -> Arc<PageImage>
    where
        F: FnOnce() -> bool,
    {
        let empty = || Arc::new(PageImage::empty());
        let (Some(document), Some(layout)) = (&self.document, self.layouts.get(request.page)) else {
            return empty();
        };

        let (mut page_width, mut page_height) = (layout.width, layout.height);
        if layout.orientation.is_sideways() {
            std::mem::swap(&mut page_width, &mut page_height);
        }
        if page_width <= 0.0 || page_height <= 0.0 {
            return empty();
        }
        let fake_dpi_x = (f64::from(request.width) / page_width * self.config.dpi_x) as f32;
        let fake_dpi_y = (f64::from(request.height) / page_height * self.config.dpi_y) as f32;

        let Ok(page) = document.page(request.page) else {
            return empty();
        };
        if should_abort() {
            debug!(page = request.page, "render aborted before start");
            return empty();
        }

        match request.tile {
            Some(tile) => {
                let rect = tile.geometry(request.width, request.height);
                if rect.is_empty() {
                    return empty();
                }
                Arc::new(page.render_region(
                    fake_dpi_x,
                    fake_dpi_y,
                    rect.left,
                    rect.top,
                    rect.width() as u32,
                    rect.height() as u32,
                ))
            }
            None => page.image(request.width, request.height),
        }
    }

    /// Text of page `index`, boxes normalized to the page size.
    ///
    /// The first request for a page also carries its links and, when the
    /// page turns out to be rotated, its corrected layout.
    pub fn text_page(&mut self, index: usize) -> Option<TextPage> {
        let document = self.document.as_ref()?;
        let page = document.page(index).ok()?;
        let size = page.size();

        let entities = page
            .characters()
            .iter()
            .map(|entity| TextEntity {
                text: entity.text,
                rect: NormalizedRect::from_pixel_rect(&entity.area, size.width, size.height),
            })
            .collect();

        let mut text_page = TextPage {
            page: index,
            entities,
            links: None,
            relayout: None,
        };

        if !self.text_served[index] {
            if page.has_links() {
                text_page.links = Some(page.links().to_vec());
            }
            let orientation = page.orientation();
            if self.layouts[index].orientation != orientation {
                let layout = self.layout(document, index, orientation);
                debug!(page = index, degrees = orientation.as_degrees(), "page relayout");
                text_page.relayout = Some(layout.clone());
                self.layouts[index] = layout;
            }
        }
        self.text_served[index] = true;
        Some(text_page)
    }

    /// Answer a metadata query. `None` when there is no document or no answer.
    pub fn meta_data(&self, key: MetaDataKey<'_>) -> Option<MetaDataValue> {
        let document = self.document.as_ref()?;
        match key {
            MetaDataKey::StartFullScreen => Some(MetaDataValue::Flag(document.start_full_screen())),
            MetaDataKey::NamedViewport(name) => document.named_viewport(name).map(MetaDataValue::Viewport),
            MetaDataKey::DocumentTitle => Some(MetaDataValue::Text(
                document.meta_text("Title").unwrap_or_default(),
            )),
            MetaDataKey::OpenToc => Some(MetaDataValue::Flag(document.open_toc())),
        }
    }

    pub fn synopsis(&self) -> Option<&Synopsis> {
        self.document.as_ref().map(Document::synopsis)
    }

    /// Document properties. Without a document only the MIME type is set.
    pub fn document_info(&self) -> DocumentInfo {
        match &self.document {
            Some(document) => document.document_info(),
            None => DocumentInfo {
                mime_type: "application/pdf",
                ..DocumentInfo::default()
            },
        }
    }
}

impl<B: Backend> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("document", &self.document)
            .field("pages", &self.layouts.len())
            .finish_non_exhaustive()
    }
}
