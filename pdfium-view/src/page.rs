//! Per-page resource management
//!
//! A [`Page`] owns the engine's page handle and text layer handle for one
//! page, loading each on first use, plus the values derived from them:
//! a single rendered image, the reconstructed characters and the link list.
//! All of it sits behind one lock, so a page can be shared between threads
//! while distinct pages work in parallel.
//!
//! Handle failures never surface as errors. A page the engine cannot load
//! renders as an empty image and reports no characters and no links.

use crate::backend::{DocumentBackend, PageBackend, TextLayerBackend};
use crate::geometry::{DeviceViewport, PageSize, Rotation};
use crate::link::{extract_links, PageLink};
use crate::render::{ClipRect, Matrix, PageImage, PixelFormat, RenderConfig};
use crate::text_layout::{reconstruct, CharEntity};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Live engine handles for a page.
///
/// Fields drop in declaration order: the text layer is released before the
/// page it depends on.
struct LoadedPage<P: PageBackend> {
    text: Option<P::TextLayer>,
    page: P,
}

struct PageState<P: PageBackend> {
    size: Option<PageSize>,
    label: Option<String>,
    loaded: Option<LoadedPage<P>>,
    load_failed: bool,
    /// Last full-page render; its dimensions are the cache key
    image: Option<Arc<PageImage>>,
    characters: Option<Arc<[CharEntity]>>,
    has_links: Option<bool>,
    links: Option<Arc<[PageLink]>>,
}

impl<P: PageBackend> Default for PageState<P> {
    fn default() -> Self {
        Self {
            size: None,
            label: None,
            loaded: None,
            load_failed: false,
            image: None,
            characters: None,
            has_links: None,
            links: None,
        }
    }
}

impl<P: PageBackend> PageState<P> {
    /// Release the text layer, then the page.
    fn release_handles(&mut self, index: usize) {
        if let Some(mut loaded) = self.loaded.take() {
            if loaded.text.take().is_some() {
                trace!(page = index, "released text layer");
            }
            drop(loaded);
            trace!(page = index, "released page handle");
        }
        self.load_failed = false;
    }
}

/// One page of an open document.
///
/// The borrow on the document keeps it open for as long as the page exists.
pub struct Page<'doc, D: DocumentBackend> {
    doc: &'doc D,
    index: usize,
    render_config: RenderConfig,
    state: Mutex<PageState<D::Page>>,
}

impl<'doc, D: DocumentBackend> Page<'doc, D> {
    pub(crate) fn new(doc: &'doc D, index: usize, render_config: RenderConfig) -> Self {
        Self {
            doc,
            index,
            render_config,
            state: Mutex::new(PageState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState<D::Page>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn size_locked(&self, state: &mut PageState<D::Page>) -> PageSize {
        *state
            .size
            .get_or_insert_with(|| self.doc.page_size(self.index).unwrap_or_default())
    }

    fn page_locked<'s>(&self, state: &'s mut PageState<D::Page>) -> Option<&'s mut LoadedPage<D::Page>> {
        if state.loaded.is_none() && !state.load_failed {
            match self.doc.load_page(self.index) {
                Some(page) => {
                    debug!(page = self.index, "loaded page handle");
                    state.loaded = Some(LoadedPage { text: None, page });
                }
                None => {
                    warn!(page = self.index, "engine could not load page");
                    state.load_failed = true;
                }
            }
        }
        state.loaded.as_mut()
    }

    fn text_locked<'s>(&self, state: &'s mut PageState<D::Page>) -> Option<&'s LoadedPage<D::Page>> {
        let index = self.index;
        let loaded = self.page_locked(state)?;
        if loaded.text.is_none() {
            loaded.text = loaded.page.load_text_layer();
            match &loaded.text {
                Some(_) => debug!(page = index, "loaded text layer"),
                None => warn!(page = index, "engine could not build text layer"),
            }
        }
        loaded.text.as_ref()?;
        Some(loaded)
    }

    /// 0-based index of this page in its document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page size in points, for the page's own rotation.
    pub fn size(&self) -> PageSize {
        let mut state = self.state();
        self.size_locked(&mut state)
    }

    /// Display label (e.g. "iv"), empty when the document defines none.
    pub fn label(&self) -> String {
        let mut state = self.state();
        state
            .label
            .get_or_insert_with(|| self.doc.page_label(self.index).unwrap_or_default())
            .clone()
    }

    /// The page's own rotation. Needs the page handle.
    pub fn orientation(&self) -> Rotation {
        let mut state = self.state();
        self.page_locked(&mut state)
            .map(|loaded| loaded.page.rotation())
            .unwrap_or_default()
    }

    /// Number of characters in the text layer.
    pub fn char_count(&self) -> usize {
        let mut state = self.state();
        self.text_locked(&mut state)
            .and_then(|loaded| loaded.text.as_ref())
            .map_or(0, |text| text.char_count())
    }

    /// Number of line rectangles in the text layer.
    pub fn rect_count(&self) -> usize {
        let mut state = self.state();
        self.text_locked(&mut state)
            .and_then(|loaded| loaded.text.as_ref())
            .map_or(0, |text| text.rect_count())
    }

    /// Render the whole page scaled to `width` x `height`.
    ///
    /// The last render is kept; asking again for the same dimensions returns
    /// it without touching the engine, and any other size replaces it. An
    /// empty request, or a page that cannot be rendered, yields an empty
    /// image and empties the slot.
    pub fn image(&self, width: u32, height: u32) -> Arc<PageImage> {
        let mut state = self.state();
        if let Some(image) = &state.image {
            if image.size() == (width, height) {
                trace!(page = self.index, width, height, "image cache hit");
                return Arc::clone(image);
            }
        }
        if width == 0 || height == 0 {
            state.image = None;
            return Arc::new(PageImage::empty());
        }
        let Some(loaded) = self.page_locked(&mut state) else {
            state.image = None;
            return Arc::new(PageImage::empty());
        };

        let flags = self.render_config.flags();
        let mut image = PageImage::filled(
            width,
            height,
            flags.pixel_format(),
            self.render_config.background(),
        );
        if !loaded.page.render(&mut image, flags) {
            warn!(page = self.index, width, height, "page render failed");
            state.image = None;
            return Arc::new(PageImage::empty());
        }

        debug!(page = self.index, width, height, "rendered page image");
        let image = Arc::new(image);
        state.image = Some(Arc::clone(&image));
        image
    }

    /// Render the `width` x `height` region at `(x, y)` of the page as it
    /// would appear rasterized at `dpi_x` x `dpi_y`. Not cached.
    pub fn render_region(&self, dpi_x: f32, dpi_y: f32, x: i32, y: i32, width: u32, height: u32) -> PageImage {
        let mut state = self.state();
        if width == 0 || height == 0 {
            return PageImage::empty();
        }
        let Some(loaded) = self.page_locked(&mut state) else {
            return PageImage::empty();
        };

        let mut image = PageImage::filled(
            width,
            height,
            PixelFormat::Bgra,
            self.render_config.background(),
        );
        let matrix = Matrix::region(dpi_x, dpi_y, x, y);
        let clip = ClipRect::covering(width, height);
        if !loaded
            .page
            .render_with_matrix(&mut image, &matrix, &clip, Default::default())
        {
            warn!(page = self.index, x, y, width, height, "region render failed");
            return PageImage::empty();
        }
        image
    }

    /// Reconstructed characters in text layer order. Computed once.
    pub fn characters(&self) -> Arc<[CharEntity]> {
        let mut state = self.state();
        if let Some(characters) = &state.characters {
            return Arc::clone(characters);
        }
        let viewport = self.size_locked(&mut state).unit_viewport();
        let Some(loaded) = self.text_locked(&mut state) else {
            return Arc::from(Vec::new());
        };
        let Some(text) = loaded.text.as_ref() else {
            return Arc::from(Vec::new());
        };

        let characters: Arc<[CharEntity]> = reconstruct(&loaded.page, text, &viewport).into();
        debug!(page = self.index, count = characters.len(), "reconstructed characters");
        state.characters = Some(Arc::clone(&characters));
        characters
    }

    /// Whether the page has at least one link annotation. Cheaper than
    /// [`Page::links`]; cached independently.
    pub fn has_links(&self) -> bool {
        let mut state = self.state();
        if let Some(has_links) = state.has_links {
            return has_links;
        }
        let Some(loaded) = self.page_locked(&mut state) else {
            return false;
        };
        let has_links = loaded.page.has_links();
        state.has_links = Some(has_links);
        has_links
    }

    /// Resolved links in enumeration order. Computed once.
    pub fn links(&self) -> Arc<[PageLink]> {
        let mut state = self.state();
        if let Some(links) = &state.links {
            return Arc::clone(links);
        }
        let viewport: DeviceViewport = self.size_locked(&mut state).unit_viewport();
        let Some(loaded) = self.page_locked(&mut state) else {
            return Arc::from(Vec::new());
        };

        let annotations = loaded.page.link_annotations();
        let links: Arc<[PageLink]> = extract_links(self.doc, &loaded.page, &viewport, &annotations).into();
        debug!(
            page = self.index,
            annotations = annotations.len(),
            links = links.len(),
            "extracted links"
        );
        state.links = Some(Arc::clone(&links));
        links
    }

    /// Release the text layer only. Computed characters stay cached.
    pub fn close_text_layer(&self) {
        let mut state = self.state();
        if let Some(loaded) = state.loaded.as_mut() {
            if loaded.text.take().is_some() {
                trace!(page = self.index, "released text layer");
            }
        }
    }

    /// Release both engine handles. Cached results stay valid; the handles
    /// are loaded again if a later call needs them.
    pub fn close(&self) {
        self.state().release_handles(self.index);
    }

    /// Whether the engine page handle is currently held.
    pub fn is_loaded(&self) -> bool {
        self.state().loaded.is_some()
    }
}

impl<D: DocumentBackend> Drop for Page<'_, D> {
    fn drop(&mut self) {
        let mut state = self.state();
        state.release_handles(self.index);
        state.image = None;
        state.characters = None;
        state.links = None;
    }
}

impl<D: DocumentBackend> std::fmt::Debug for Page<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
