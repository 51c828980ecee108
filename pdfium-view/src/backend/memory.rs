//! In-memory engine
//!
//! Documents are described with plain builders ([`MemoryDocument`],
//! [`MemoryPage`], [`MemoryGlyph`], [`MemoryBookmark`]) and registered under a
//! path with [`MemoryBackend::with_document`]. The engine follows PDFium's
//! conventions where they matter to callers: page sizes are reported for the
//! rotated page, the page-to-device mapping uses PDFium's display matrices,
//! and text layers expose tight and loose glyph boxes plus line rectangles.
//!
//! Every handle acquisition and release is counted in [`MemoryStats`], which
//! also keeps an ordered [`BackendEvent`] log.

use super::{Backend, DocumentBackend, LinkAnnotation, PageBackend, TextLayerBackend};
use crate::destination::Destination;
use crate::document::PageMode;
use crate::error::{PdfError, Result};
use crate::geometry::{
    page_rect_to_device, DeviceTransform, DeviceViewport, PagePoint, PageRect, PageSize,
    PixelRect, Rotation,
};
use crate::render::{ClipRect, Matrix, PageImage, RenderFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A handle lifecycle event, in the order the engine saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    LibraryInit,
    LibraryDestroy,
    DocumentOpened,
    DocumentClosed,
    PageLoaded(usize),
    PageClosed(usize),
    TextLayerLoaded(usize),
    TextLayerClosed(usize),
}

/// Call counters shared by a backend and every handle it produced.
#[derive(Debug, Default)]
pub struct MemoryStats {
    page_loads: AtomicUsize,
    text_layer_loads: AtomicUsize,
    renders: AtomicUsize,
    link_enumerations: AtomicUsize,
    link_probes: AtomicUsize,
    events: Mutex<Vec<BackendEvent>>,
}

impl MemoryStats {
    fn record(&self, event: BackendEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Number of successful page handle loads.
    pub fn page_loads(&self) -> usize {
        self.page_loads.load(Ordering::SeqCst)
    }

    /// Number of successful text layer loads.
    pub fn text_layer_loads(&self) -> usize {
        self.text_layer_loads.load(Ordering::SeqCst)
    }

    /// Number of rasterizations (full page and matrix renders).
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Number of full link enumerations.
    pub fn link_enumerations(&self) -> usize {
        self.link_enumerations.load(Ordering::SeqCst)
    }

    /// Number of has-links probes.
    pub fn link_probes(&self) -> usize {
        self.link_probes.load(Ordering::SeqCst)
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Page and text handles currently alive.
    pub fn live_handles(&self) -> (usize, usize) {
        let events = self.events();
        let count = |open: fn(&BackendEvent) -> bool, close: fn(&BackendEvent) -> bool| {
            events.iter().filter(|e| open(e)).count() - events.iter().filter(|e| close(e)).count()
        };
        (
            count(
                |e| matches!(e, BackendEvent::PageLoaded(_)),
                |e| matches!(e, BackendEvent::PageClosed(_)),
            ),
            count(
                |e| matches!(e, BackendEvent::TextLayerLoaded(_)),
                |e| matches!(e, BackendEvent::TextLayerClosed(_)),
            ),
        )
    }
}

/// One character of a page's text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGlyph {
    pub unicode: u32,
    pub char_box: PageRect,
    pub loose_box: PageRect,
}

impl MemoryGlyph {
    /// A glyph whose loose box has no width of its own.
    pub fn new(ch: char, char_box: PageRect) -> Self {
        let loose_box = PageRect::new(char_box.left, char_box.top, char_box.left, char_box.bottom);
        Self {
            unicode: ch as u32,
            char_box,
            loose_box,
        }
    }

    pub fn with_loose_box(mut self, loose_box: PageRect) -> Self {
        self.loose_box = loose_box;
        self
    }
}

/// Description of one page.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    /// Unrotated media size
    media: PageSize,
    rotation: Rotation,
    label: Option<String>,
    glyphs: Vec<MemoryGlyph>,
    line_rects: Vec<PageRect>,
    links: Vec<LinkAnnotation>,
    unloadable: bool,
    without_text: bool,
}

impl MemoryPage {
    pub fn new(media: PageSize) -> Self {
        Self {
            media,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_glyph(mut self, glyph: MemoryGlyph) -> Self {
        self.glyphs.push(glyph);
        self
    }

    pub fn with_line_rect(mut self, rect: PageRect) -> Self {
        self.line_rects.push(rect);
        self
    }

    /// Lay out `text` as one line of fixed-advance glyphs whose boxes span
    /// `[top - height, top]`, and add the covering line rectangle.
    /// `\r` and `\n` become zero-size glyphs at the pen position.
    pub fn with_text_line(mut self, text: &str, left: f64, top: f64, advance: f64, height: f64) -> Self {
        let mut pen = left;
        for ch in text.chars() {
            if ch == '\r' || ch == '\n' {
                let collapsed = PageRect::new(pen, top, pen, top);
                self.glyphs.push(MemoryGlyph::new(ch, collapsed));
                continue;
            }
            let bbox = PageRect::new(pen, top, pen + advance, top - height);
            self.glyphs.push(MemoryGlyph::new(ch, bbox));
            pen += advance;
        }
        if pen > left {
            self.line_rects
                .push(PageRect::new(left, top, pen, top - height));
        }
        self
    }

    pub fn with_link(mut self, link: LinkAnnotation) -> Self {
        self.links.push(link);
        self
    }

    /// The engine refuses to load this page.
    pub fn unloadable(mut self) -> Self {
        self.unloadable = true;
        self
    }

    /// The engine loads the page but cannot build a text layer for it.
    pub fn without_text_layer(mut self) -> Self {
        self.without_text = true;
        self
    }

    /// Size as reported for the rotated page.
    pub fn size(&self) -> PageSize {
        if self.rotation.is_sideways() {
            PageSize::new(self.media.height, self.media.width)
        } else {
            self.media
        }
    }
}

/// Outline entry description.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookmark {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<MemoryBookmark>,
}

impl MemoryBookmark {
    pub fn new(title: &str, destination: Option<Destination>) -> Self {
        Self {
            title: title.to_string(),
            destination,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: MemoryBookmark) -> Self {
        self.children.push(child);
        self
    }
}

/// Description of one document.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    password: Option<String>,
    corrupt: bool,
    page_mode: PageMode,
    meta: HashMap<String, String>,
    bookmarks: Vec<MemoryBookmark>,
    named: HashMap<String, Destination>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Require `password` to open.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Opening fails as a format error.
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }

    pub fn with_page_mode(mut self, mode: PageMode) -> Self {
        self.page_mode = mode;
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_bookmark(mut self, bookmark: MemoryBookmark) -> Self {
        self.bookmarks.push(bookmark);
        self
    }

    pub fn with_named_destination(mut self, name: &str, destination: Destination) -> Self {
        self.named.insert(name.to_string(), destination);
        self
    }

    /// Open the description directly, bypassing password checks.
    pub fn open_unlocked(self) -> MemoryOpenDocument {
        MemoryOpenDocument::new(Arc::new(self), Arc::new(MemoryStats::default()))
    }

    fn bookmark_at(&self, path: &[usize]) -> Option<&MemoryBookmark> {
        let (first, rest) = path.split_first()?;
        let mut node = self.bookmarks.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }
}

/// The in-memory engine.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<PathBuf, Arc<MemoryDocument>>>,
    stats: Arc<MemoryStats>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `path`.
    pub fn with_document<P: AsRef<Path>>(self, path: P, document: MemoryDocument) -> Self {
        self.register(path, document);
        self
    }

    pub fn register<P: AsRef<Path>>(&self, path: P, document: MemoryDocument) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.as_ref().to_path_buf(), Arc::new(document));
    }

    /// Counters shared with every handle this backend produced.
    pub fn stats(&self) -> Arc<MemoryStats> {
        Arc::clone(&self.stats)
    }
}

impl Backend for MemoryBackend {
    type Document = MemoryOpenDocument;

    fn init_library(&self) {
        self.stats.record(BackendEvent::LibraryInit);
    }

    fn destroy_library(&self) {
        self.stats.record(BackendEvent::LibraryDestroy);
    }

    fn load_document(&self, path: &Path, password: Option<&str>) -> Result<Self::Document> {
        let document = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| PdfError::FileNotFound(path.display().to_string()))?;

        if document.corrupt {
            return Err(PdfError::OpenFailed {
                reason: "PDFium error code: 3".to_string(),
            });
        }
        if let Some(expected) = &document.password {
            if password != Some(expected.as_str()) {
                return Err(PdfError::InvalidPassword);
            }
        }

        Ok(MemoryOpenDocument::new(document, Arc::clone(&self.stats)))
    }
}

/// An open in-memory document.
#[derive(Debug)]
pub struct MemoryOpenDocument {
    desc: Arc<MemoryDocument>,
    stats: Arc<MemoryStats>,
}

impl MemoryOpenDocument {
    fn new(desc: Arc<MemoryDocument>, stats: Arc<MemoryStats>) -> Self {
        stats.record(BackendEvent::DocumentOpened);
        Self { desc, stats }
    }

    pub fn stats(&self) -> Arc<MemoryStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for MemoryOpenDocument {
    fn drop(&mut self) {
        self.stats.record(BackendEvent::DocumentClosed);
    }
}

impl DocumentBackend for MemoryOpenDocument {
    type Page = MemoryOpenPage;
    type Bookmark = Vec<usize>;

    fn page_count(&self) -> usize {
        self.desc.pages.len()
    }

    fn page_mode(&self) -> PageMode {
        self.desc.page_mode
    }

    fn meta_text(&self, key: &str) -> Option<String> {
        self.desc.meta.get(key).cloned()
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        self.desc.pages.get(index).map(MemoryPage::size)
    }

    fn page_label(&self, index: usize) -> Option<String> {
        self.desc.pages.get(index)?.label.clone()
    }

    fn load_page(&self, index: usize) -> Option<Self::Page> {
        let page = self.desc.pages.get(index)?;
        if page.unloadable {
            return None;
        }
        self.stats.page_loads.fetch_add(1, Ordering::SeqCst);
        self.stats.record(BackendEvent::PageLoaded(index));
        Some(MemoryOpenPage {
            desc: Arc::clone(&self.desc),
            index,
            stats: Arc::clone(&self.stats),
        })
    }

    fn named_destination(&self, name: &str) -> Option<Destination> {
        self.desc.named.get(name).copied()
    }

    fn first_child(&self, parent: Option<&Self::Bookmark>) -> Option<Self::Bookmark> {
        let mut path = parent.cloned().unwrap_or_default();
        path.push(0);
        self.desc.bookmark_at(&path).map(|_| path)
    }

    fn next_sibling(&self, bookmark: &Self::Bookmark) -> Option<Self::Bookmark> {
        let mut path = bookmark.clone();
        *path.last_mut()? += 1;
        self.desc.bookmark_at(&path).map(|_| path)
    }

    fn bookmark_title(&self, bookmark: &Self::Bookmark) -> String {
        self.desc
            .bookmark_at(bookmark)
            .map(|b| b.title.clone())
            .unwrap_or_default()
    }

    fn bookmark_destination(&self, bookmark: &Self::Bookmark) -> Option<Destination> {
        self.desc.bookmark_at(bookmark)?.destination
    }
}

/// A loaded in-memory page.
#[derive(Debug)]
pub struct MemoryOpenPage {
    desc: Arc<MemoryDocument>,
    index: usize,
    stats: Arc<MemoryStats>,
}

impl MemoryOpenPage {
    fn page(&self) -> &MemoryPage {
        &self.desc.pages[self.index]
    }

    /// Paint every glyph box black, mapping page space into `target` with `map`.
    fn paint_glyphs<F>(&self, target: &mut PageImage, map: F)
    where
        F: Fn(&PageRect) -> Option<PixelRect>,
    {
        // Opaque black reads the same in either byte order.
        let black = [0u8, 0, 0, 0xFF];
        let (width, height) = (target.width() as i32, target.height() as i32);
        let stride = target.stride();
        for glyph in &self.page().glyphs {
            let Some(rect) = map(&glyph.char_box) else {
                continue;
            };
            let rect = PixelRect::new(
                rect.left.max(0),
                rect.top.max(0),
                rect.right.min(width),
                rect.bottom.min(height),
            );
            if rect.is_empty() {
                continue;
            }
            let data = target.data_mut();
            for y in rect.top..rect.bottom {
                for x in rect.left..rect.right {
                    let offset = y as usize * stride + x as usize * 4;
                    data[offset..offset + 4].copy_from_slice(&black);
                }
            }
        }
    }
}

impl Drop for MemoryOpenPage {
    fn drop(&mut self) {
        self.stats.record(BackendEvent::PageClosed(self.index));
    }
}

impl DeviceTransform for MemoryOpenPage {
    fn page_to_device(&self, vp: &DeviceViewport, point: PagePoint) -> Option<(i32, i32)> {
        let media = self.page().media;
        if media.is_empty() {
            return None;
        }
        let (w, h) = (media.width, media.height);
        let (ux, uy) = match self.page().rotation.then(vp.rotate) {
            Rotation::None => (point.x / w, (h - point.y) / h),
            Rotation::Clockwise90 => (point.y / h, point.x / w),
            Rotation::Rotated180 => ((w - point.x) / w, point.y / h),
            Rotation::Clockwise270 => ((h - point.y) / h, (w - point.x) / w),
        };
        let x = vp.start_x as f64 + ux * vp.size_x as f64;
        let y = vp.start_y as f64 + uy * vp.size_y as f64;
        Some((x.round() as i32, y.round() as i32))
    }

    fn device_to_page(&self, vp: &DeviceViewport, x: i32, y: i32) -> Option<PagePoint> {
        let media = self.page().media;
        if media.is_empty() || vp.size_x == 0 || vp.size_y == 0 {
            return None;
        }
        let (w, h) = (media.width, media.height);
        let ux = (x - vp.start_x) as f64 / vp.size_x as f64;
        let uy = (y - vp.start_y) as f64 / vp.size_y as f64;
        let point = match self.page().rotation.then(vp.rotate) {
            Rotation::None => PagePoint::new(ux * w, h - uy * h),
            Rotation::Clockwise90 => PagePoint::new(uy * w, ux * h),
            Rotation::Rotated180 => PagePoint::new(w - ux * w, uy * h),
            Rotation::Clockwise270 => PagePoint::new(w - uy * w, h - ux * h),
        };
        Some(point)
    }
}

impl PageBackend for MemoryOpenPage {
    type TextLayer = MemoryTextLayer;

    fn rotation(&self) -> Rotation {
        self.page().rotation
    }

    fn load_text_layer(&self) -> Option<Self::TextLayer> {
        if self.page().without_text {
            return None;
        }
        self.stats.text_layer_loads.fetch_add(1, Ordering::SeqCst);
        self.stats.record(BackendEvent::TextLayerLoaded(self.index));
        Some(MemoryTextLayer {
            desc: Arc::clone(&self.desc),
            index: self.index,
            stats: Arc::clone(&self.stats),
        })
    }

    fn render(&self, target: &mut PageImage, _flags: RenderFlags) -> bool {
        if target.is_empty() {
            return false;
        }
        self.stats.renders.fetch_add(1, Ordering::SeqCst);
        let viewport = DeviceViewport::new(target.width() as i32, target.height() as i32);
        self.paint_glyphs(target, |rect| page_rect_to_device(self, &viewport, rect));
        true
    }

    fn render_with_matrix(
        &self,
        target: &mut PageImage,
        matrix: &Matrix,
        clip: &ClipRect,
        _flags: RenderFlags,
    ) -> bool {
        if target.is_empty() {
            return false;
        }
        self.stats.renders.fetch_add(1, Ordering::SeqCst);
        let unit = self.page().size().unit_viewport();
        let apply = |x: i32, y: i32| {
            let (x, y) = (x as f32, y as f32);
            (
                (matrix.a * x + matrix.c * y + matrix.e).round() as i32,
                (matrix.b * x + matrix.d * y + matrix.f).round() as i32,
            )
        };
        self.paint_glyphs(target, |rect| {
            let unit_rect = page_rect_to_device(self, &unit, rect)?;
            let (l, t) = apply(unit_rect.left, unit_rect.top);
            let (r, b) = apply(unit_rect.right, unit_rect.bottom);
            let rect = PixelRect::new(l, t, r, b).normalized();
            Some(PixelRect::new(
                rect.left.max(clip.left as i32),
                rect.top.max(clip.top as i32),
                rect.right.min(clip.right as i32 + 1),
                rect.bottom.min(clip.bottom as i32 + 1),
            ))
        });
        true
    }

    fn has_links(&self) -> bool {
        self.stats.link_probes.fetch_add(1, Ordering::SeqCst);
        !self.page().links.is_empty()
    }

    fn link_annotations(&self) -> Vec<LinkAnnotation> {
        self.stats.link_enumerations.fetch_add(1, Ordering::SeqCst);
        self.page().links.clone()
    }
}

/// A loaded in-memory text layer.
#[derive(Debug)]
pub struct MemoryTextLayer {
    desc: Arc<MemoryDocument>,
    index: usize,
    stats: Arc<MemoryStats>,
}

impl MemoryTextLayer {
    fn page(&self) -> &MemoryPage {
        &self.desc.pages[self.index]
    }
}

impl Drop for MemoryTextLayer {
    fn drop(&mut self) {
        self.stats.record(BackendEvent::TextLayerClosed(self.index));
    }
}

impl TextLayerBackend for MemoryTextLayer {
    fn char_count(&self) -> usize {
        self.page().glyphs.len()
    }

    fn rect_count(&self) -> usize {
        self.page().line_rects.len()
    }

    fn unicode(&self, index: usize) -> u32 {
        self.page().glyphs.get(index).map_or(0, |g| g.unicode)
    }

    fn char_box(&self, index: usize) -> Option<PageRect> {
        self.page().glyphs.get(index).map(|g| g.char_box)
    }

    fn loose_char_box(&self, index: usize) -> Option<PageRect> {
        self.page().glyphs.get(index).map(|g| g.loose_box)
    }

    fn rect(&self, index: usize) -> Option<PageRect> {
        self.page().line_rects.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PixelFormat;

    fn letter_page() -> MemoryPage {
        MemoryPage::new(PageSize::new(612.0, 792.0))
    }

    #[test]
    fn test_password_and_missing_file() {
        let backend = MemoryBackend::new()
            .with_document("secret.pdf", MemoryDocument::new().with_password("pw"))
            .with_document("broken.pdf", MemoryDocument::new().corrupt());

        assert!(matches!(
            backend.load_document(Path::new("secret.pdf"), None),
            Err(PdfError::InvalidPassword)
        ));
        assert!(matches!(
            backend.load_document(Path::new("secret.pdf"), Some("nope")),
            Err(PdfError::InvalidPassword)
        ));
        assert!(backend
            .load_document(Path::new("secret.pdf"), Some("pw"))
            .is_ok());
        assert!(matches!(
            backend.load_document(Path::new("missing.pdf"), None),
            Err(PdfError::FileNotFound(_))
        ));
        assert!(matches!(
            backend.load_document(Path::new("broken.pdf"), None),
            Err(PdfError::OpenFailed { .. })
        ));
    }

    #[test]
    fn test_rotated_page_size_and_transform() {
        let doc = MemoryDocument::new()
            .with_page(letter_page().with_rotation(Rotation::Clockwise90))
            .open_unlocked();
        assert_eq!(doc.page_size(0), Some(PageSize::new(792.0, 612.0)));

        let page = doc.load_page(0).unwrap();
        let vp = DeviceViewport::new(792, 612);
        // Bottom-left of the page lands top-left after a clockwise turn.
        assert_eq!(page.page_to_device(&vp, PagePoint::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(page.page_to_device(&vp, PagePoint::new(0.0, 792.0)), Some((792, 0)));
        let back = page.device_to_page(&vp, 792, 0).unwrap();
        assert_eq!(back, PagePoint::new(0.0, 792.0));
    }

    #[test]
    fn test_transform_round_trip_all_rotations() {
        for raw in 0..4 {
            let doc = MemoryDocument::new()
                .with_page(letter_page().with_rotation(Rotation::from_raw(raw)))
                .open_unlocked();
            let page = doc.load_page(0).unwrap();
            let vp = doc.page_size(0).unwrap().unit_viewport();
            let point = PagePoint::new(100.0, 200.0);
            let (x, y) = page.page_to_device(&vp, point).unwrap();
            let back = page.device_to_page(&vp, x, y).unwrap();
            assert!((back.x - point.x).abs() < 1e-9, "rotation {raw}");
            assert!((back.y - point.y).abs() < 1e-9, "rotation {raw}");
        }
    }

    #[test]
    fn test_handle_events_are_logged() {
        let doc = MemoryDocument::new().with_page(letter_page()).open_unlocked();
        let stats = doc.stats();
        let page = doc.load_page(0).unwrap();
        let text = page.load_text_layer().unwrap();
        assert_eq!(stats.live_handles(), (1, 1));
        drop(text);
        drop(page);
        assert_eq!(
            stats.events(),
            vec![
                BackendEvent::DocumentOpened,
                BackendEvent::PageLoaded(0),
                BackendEvent::TextLayerLoaded(0),
                BackendEvent::TextLayerClosed(0),
                BackendEvent::PageClosed(0),
            ]
        );
        assert_eq!(stats.live_handles(), (0, 0));
    }

    #[test]
    fn test_text_line_layout() {
        let page = letter_page().with_text_line("Hi\n", 72.0, 720.0, 10.0, 12.0);
        assert_eq!(page.glyphs.len(), 3);
        assert_eq!(page.glyphs[1].char_box, PageRect::new(82.0, 720.0, 92.0, 708.0));
        assert_eq!(page.glyphs[2].char_box.width(), 0.0);
        assert_eq!(page.line_rects, vec![PageRect::new(72.0, 720.0, 92.0, 708.0)]);
    }

    #[test]
    fn test_bookmark_paths() {
        let doc = MemoryDocument::new()
            .with_bookmark(
                MemoryBookmark::new("One", None).with_child(MemoryBookmark::new("One.a", None)),
            )
            .with_bookmark(MemoryBookmark::new("Two", None))
            .open_unlocked();

        let first = doc.first_child(None).unwrap();
        assert_eq!(doc.bookmark_title(&first), "One");
        let child = doc.first_child(Some(&first)).unwrap();
        assert_eq!(doc.bookmark_title(&child), "One.a");
        assert!(doc.next_sibling(&child).is_none());
        let second = doc.next_sibling(&first).unwrap();
        assert_eq!(doc.bookmark_title(&second), "Two");
        assert!(doc.first_child(Some(&second)).is_none());
    }

    #[test]
    fn test_render_paints_glyphs() {
        let doc = MemoryDocument::new()
            .with_page(letter_page().with_text_line("X", 0.0, 792.0, 306.0, 396.0))
            .open_unlocked();
        let page = doc.load_page(0).unwrap();
        let mut image = PageImage::filled(4, 4, PixelFormat::Rgba, 0xFFFF_FFFF);
        assert!(page.render(&mut image, RenderFlags::page_image()));
        // The glyph covers the top-left quarter.
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0xFF]));
        assert_eq!(image.pixel(3, 3), Some([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(doc.stats().renders(), 1);
    }
}
