//! Native PDFium engine
//!
//! Thin owners around the raw PDFium handles. Each owner closes its handle
//! in `Drop`; the borrow structure of [`crate::Page`] guarantees that text
//! layers drop before their page and pages before their document.

use crate::backend::{Backend, DocumentBackend, LinkAnnotation, PageBackend, TextLayerBackend};
use crate::destination::Destination;
use crate::document::PageMode;
use crate::error::{PdfError, Result};
use crate::geometry::{DeviceTransform, DeviceViewport, PagePoint, PageRect, PageSize, Rotation};
use crate::render::{ClipRect, Matrix, PageImage, RenderFlags};
use libc::{c_int, c_ulong, c_void};
use pdfium_sys::*;
use std::ffi::CString;
use std::path::Path;
use tracing::debug;

/// Read a UTF-16LE string through PDFium's "call twice" buffer protocol.
///
/// `fetch` receives a buffer pointer and its length in bytes and returns the
/// required length, terminator included.
fn read_utf16<F>(mut fetch: F) -> Option<String>
where
    F: FnMut(*mut c_void, c_ulong) -> c_ulong,
{
    let size = fetch(std::ptr::null_mut(), 0);
    if size <= 2 {
        return None;
    }
    let mut buffer: Vec<u8> = vec![0; size as usize];
    fetch(buffer.as_mut_ptr() as *mut c_void, size);

    // Remove trailing null characters
    while buffer.len() >= 2 && buffer[buffer.len() - 1] == 0 && buffer[buffer.len() - 2] == 0 {
        buffer.pop();
        buffer.pop();
    }
    let utf16: Vec<u16> = buffer
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16(&utf16).ok()
}

fn raw_flags(flags: RenderFlags) -> c_int {
    let mut raw = 0;
    if flags.annotations {
        raw |= FPDF_ANNOT;
    }
    if flags.lcd_text {
        raw |= FPDF_LCD_TEXT;
    }
    if flags.reverse_byte_order {
        raw |= FPDF_REVERSE_BYTE_ORDER;
    }
    if flags.printing {
        raw |= FPDF_PRINTING;
    }
    raw as c_int
}

/// Convert a destination handle. Null handles and negative page indices
/// yield `None`.
fn destination(document: FPDF_DOCUMENT, dest: FPDF_DEST) -> Option<Destination> {
    if dest.is_null() {
        return None;
    }
    // SAFETY: `dest` was returned for `document`, which is still open.
    let page = unsafe { FPDFDest_GetDestPageIndex(document, dest) };
    let page_index = usize::try_from(page).ok()?;

    let (mut has_x, mut has_y, mut has_zoom) = (0, 0, 0);
    let (mut x, mut y, mut zoom) = (0.0f32, 0.0f32, 0.0f32);
    // SAFETY: all out-pointers point at live locals.
    let ok = unsafe {
        FPDFDest_GetLocationInPage(dest, &mut has_x, &mut has_y, &mut has_zoom, &mut x, &mut y, &mut zoom)
    };
    let location = (ok != 0 && has_x != 0 && has_y != 0).then(|| PagePoint::new(f64::from(x), f64::from(y)));
    Some(Destination {
        page_index: Some(page_index),
        location,
    })
}

/// The PDFium engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for PdfiumBackend {
    type Document = PdfiumDocument;

    fn init_library(&self) {
        // SAFETY: only called by the first library user.
        unsafe { FPDF_InitLibrary() };
        debug!("pdfium library initialized");
    }

    fn destroy_library(&self) {
        // SAFETY: only called once the last library user is gone.
        unsafe { FPDF_DestroyLibrary() };
        debug!("pdfium library destroyed");
    }

    fn load_document(&self, path: &Path, password: Option<&str>) -> Result<PdfiumDocument> {
        if !path.exists() {
            return Err(PdfError::FileNotFound(path.display().to_string()));
        }

        let c_path = CString::new(path.to_string_lossy().as_bytes()).map_err(|_| PdfError::OpenFailed {
            reason: "Invalid path encoding".to_string(),
        })?;
        let c_password = password.and_then(|p| CString::new(p).ok());
        let password_ptr = c_password.as_ref().map(|p| p.as_ptr()).unwrap_or(std::ptr::null());

        // SAFETY: both strings are NUL-terminated and live across the call.
        let handle = unsafe { FPDF_LoadDocument(c_path.as_ptr(), password_ptr) };
        if handle.is_null() {
            // SAFETY: plain query of thread-local engine state.
            let error = unsafe { FPDF_GetLastError() };
            return Err(match error as u32 {
                FPDF_ERR_PASSWORD => PdfError::InvalidPassword,
                FPDF_ERR_FILE => PdfError::FileNotFound(path.display().to_string()),
                _ => PdfError::OpenFailed {
                    reason: format!("PDFium error code: {}", error),
                },
            });
        }
        Ok(PdfiumDocument { handle })
    }
}

/// An open PDFium document.
#[derive(Debug)]
pub struct PdfiumDocument {
    handle: FPDF_DOCUMENT,
}

// SAFETY: every access to the handle goes through the per-page locks and the
// document's shared borrow; PDFium document handles tolerate that.
unsafe impl Send for PdfiumDocument {}
unsafe impl Sync for PdfiumDocument {}

impl Drop for PdfiumDocument {
    fn drop(&mut self) {
        unsafe {
            FPDF_CloseDocument(self.handle);
        }
    }
}

/// Bookmark handle; valid while its document is open.
#[derive(Debug, Clone, Copy)]
pub struct PdfiumBookmark(FPDF_BOOKMARK);

fn bookmark(handle: FPDF_BOOKMARK) -> Option<PdfiumBookmark> {
    (!handle.is_null()).then_some(PdfiumBookmark(handle))
}

impl DocumentBackend for PdfiumDocument {
    type Page = PdfiumPage;
    type Bookmark = PdfiumBookmark;

    fn page_count(&self) -> usize {
        // SAFETY: open document handle.
        let count = unsafe { FPDF_GetPageCount(self.handle) };
        usize::try_from(count).unwrap_or(0)
    }

    fn page_mode(&self) -> PageMode {
        // SAFETY: open document handle.
        PageMode::from_raw(unsafe { FPDFDoc_GetPageMode(self.handle) })
    }

    fn meta_text(&self, key: &str) -> Option<String> {
        let c_tag = CString::new(key).ok()?;
        // SAFETY: `buffer` holds `len` writable bytes or is null with len 0.
        read_utf16(|buffer, len| unsafe { FPDF_GetMetaText(self.handle, c_tag.as_ptr(), buffer, len) })
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        let index = c_int::try_from(index).ok()?;
        let (mut width, mut height) = (0.0, 0.0);
        // SAFETY: out-pointers point at live locals.
        let ok = unsafe { FPDF_GetPageSizeByIndex(self.handle, index, &mut width, &mut height) };
        (ok != 0).then(|| PageSize::new(width, height))
    }

    fn page_label(&self, index: usize) -> Option<String> {
        let index = c_int::try_from(index).ok()?;
        // SAFETY: `buffer` holds `len` writable bytes or is null with len 0.
        read_utf16(|buffer, len| unsafe { FPDF_GetPageLabel(self.handle, index, buffer, len) })
    }

    fn load_page(&self, index: usize) -> Option<PdfiumPage> {
        let index = c_int::try_from(index).ok()?;
        // SAFETY: open document handle; PDFium range-checks the index.
        let handle = unsafe { FPDF_LoadPage(self.handle, index) };
        (!handle.is_null()).then_some(PdfiumPage {
            handle,
            document: self.handle,
        })
    }

    fn named_destination(&self, name: &str) -> Option<Destination> {
        let c_name = CString::new(name).ok()?;
        // SAFETY: NUL-terminated name, open document handle.
        let dest = unsafe { FPDF_GetNamedDestByName(self.handle, c_name.as_ptr()) };
        destination(self.handle, dest)
    }

    fn first_child(&self, parent: Option<&PdfiumBookmark>) -> Option<PdfiumBookmark> {
        let parent = parent.map_or(std::ptr::null_mut(), |b| b.0);
        // SAFETY: null asks for the first root entry.
        bookmark(unsafe { FPDFBookmark_GetFirstChild(self.handle, parent) })
    }

    fn next_sibling(&self, current: &PdfiumBookmark) -> Option<PdfiumBookmark> {
        // SAFETY: bookmark handle from this document.
        bookmark(unsafe { FPDFBookmark_GetNextSibling(self.handle, current.0) })
    }

    fn bookmark_title(&self, current: &PdfiumBookmark) -> String {
        // SAFETY: `buffer` holds `len` writable bytes or is null with len 0.
        read_utf16(|buffer, len| unsafe { FPDFBookmark_GetTitle(current.0, buffer, len) }).unwrap_or_default()
    }

    fn bookmark_destination(&self, current: &PdfiumBookmark) -> Option<Destination> {
        // SAFETY: bookmark handle from this document.
        let dest = unsafe { FPDFBookmark_GetDest(self.handle, current.0) };
        destination(self.handle, dest)
    }
}

/// A loaded PDFium page.
#[derive(Debug)]
pub struct PdfiumPage {
    handle: FPDF_PAGE,
    document: FPDF_DOCUMENT,
}

// SAFETY: Page handles are safe to send between threads
unsafe impl Send for PdfiumPage {}

impl Drop for PdfiumPage {
    fn drop(&mut self) {
        unsafe {
            FPDF_ClosePage(self.handle);
        }
    }
}

impl PdfiumPage {
    /// Wrap `target`'s buffer in a PDFium bitmap for the duration of `draw`.
    fn with_bitmap<F>(&self, target: &mut PageImage, draw: F) -> bool
    where
        F: FnOnce(FPDF_BITMAP),
    {
        if target.is_empty() {
            return false;
        }
        let (Ok(width), Ok(height), Ok(stride)) = (
            c_int::try_from(target.width()),
            c_int::try_from(target.height()),
            c_int::try_from(target.stride()),
        ) else {
            return false;
        };
        // SAFETY: the buffer is `stride * height` bytes and outlives the bitmap,
        // which is destroyed before returning.
        unsafe {
            let bitmap = FPDFBitmap_CreateEx(
                width,
                height,
                FPDFBitmap_BGRA as c_int,
                target.data_mut().as_mut_ptr() as *mut c_void,
                stride,
            );
            if bitmap.is_null() {
                return false;
            }
            draw(bitmap);
            FPDFBitmap_Destroy(bitmap);
        }
        true
    }
}

impl DeviceTransform for PdfiumPage {
    fn page_to_device(&self, viewport: &DeviceViewport, point: PagePoint) -> Option<(i32, i32)> {
        let (mut x, mut y) = (0, 0);
        // SAFETY: live page handle, out-pointers point at locals.
        let ok = unsafe {
            FPDF_PageToDevice(
                self.handle,
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotate.as_raw(),
                point.x,
                point.y,
                &mut x,
                &mut y,
            )
        };
        (ok != 0).then_some((x, y))
    }

    fn device_to_page(&self, viewport: &DeviceViewport, x: i32, y: i32) -> Option<PagePoint> {
        let (mut page_x, mut page_y) = (0.0, 0.0);
        // SAFETY: live page handle, out-pointers point at locals.
        let ok = unsafe {
            FPDF_DeviceToPage(
                self.handle,
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotate.as_raw(),
                x,
                y,
                &mut page_x,
                &mut page_y,
            )
        };
        (ok != 0).then(|| PagePoint::new(page_x, page_y))
    }
}

impl PageBackend for PdfiumPage {
    type TextLayer = PdfiumTextLayer;

    fn rotation(&self) -> Rotation {
        // SAFETY: live page handle.
        Rotation::from_raw(unsafe { FPDFPage_GetRotation(self.handle) })
    }

    fn load_text_layer(&self) -> Option<PdfiumTextLayer> {
        // SAFETY: live page handle.
        let handle = unsafe { FPDFText_LoadPage(self.handle) };
        (!handle.is_null()).then_some(PdfiumTextLayer { handle })
    }

    fn render(&self, target: &mut PageImage, flags: RenderFlags) -> bool {
        let (width, height) = (target.width() as c_int, target.height() as c_int);
        self.with_bitmap(target, |bitmap| {
            // SAFETY: bitmap and page are live for the call.
            unsafe { FPDF_RenderPageBitmap(bitmap, self.handle, 0, 0, width, height, 0, raw_flags(flags)) }
        })
    }

    fn render_with_matrix(&self, target: &mut PageImage, matrix: &Matrix, clip: &ClipRect, flags: RenderFlags) -> bool {
        let matrix = FS_MATRIX {
            a: matrix.a,
            b: matrix.b,
            c: matrix.c,
            d: matrix.d,
            e: matrix.e,
            f: matrix.f,
        };
        let clip = FS_RECTF {
            left: clip.left,
            top: clip.top,
            right: clip.right,
            bottom: clip.bottom,
        };
        self.with_bitmap(target, |bitmap| {
            // SAFETY: matrix and clip are locals that outlive the call.
            unsafe { FPDF_RenderPageBitmapWithMatrix(bitmap, self.handle, &matrix, &clip, raw_flags(flags)) }
        })
    }

    fn has_links(&self) -> bool {
        let mut start: c_int = 0;
        let mut link: FPDF_LINK = std::ptr::null_mut();
        // SAFETY: live page handle, out-pointers point at locals.
        unsafe { FPDFLink_Enumerate(self.handle, &mut start, &mut link) != 0 }
    }

    fn link_annotations(&self) -> Vec<LinkAnnotation> {
        let mut annotations = Vec::new();
        let mut start: c_int = 0;
        let mut link: FPDF_LINK = std::ptr::null_mut();

        // SAFETY: live page handle; `link` is only used until the next call.
        while unsafe { FPDFLink_Enumerate(self.handle, &mut start, &mut link) } != 0 {
            let dest = unsafe { FPDFLink_GetDest(self.document, link) };
            let action = unsafe { FPDFLink_GetAction(link) };
            let uri = (!action.is_null())
                .then(|| {
                    let size = unsafe { FPDFAction_GetURIPath(self.document, action, std::ptr::null_mut(), 0) };
                    if size == 0 {
                        return None;
                    }
                    let mut buffer = vec![0u8; size as usize];
                    unsafe {
                        FPDFAction_GetURIPath(self.document, action, buffer.as_mut_ptr() as *mut c_void, size);
                    }
                    Some(buffer)
                })
                .flatten();

            let mut rect = FS_RECTF::default();
            let has_rect = unsafe { FPDFLink_GetAnnotRect(link, &mut rect) } != 0;

            annotations.push(LinkAnnotation {
                destination: destination(self.document, dest),
                uri,
                rect: has_rect.then(|| {
                    PageRect::new(
                        f64::from(rect.left),
                        f64::from(rect.top),
                        f64::from(rect.right),
                        f64::from(rect.bottom),
                    )
                }),
            });
        }
        annotations
    }
}

/// A loaded PDFium text page.
#[derive(Debug)]
pub struct PdfiumTextLayer {
    handle: FPDF_TEXTPAGE,
}

// SAFETY: only reached through the owning page's lock.
unsafe impl Send for PdfiumTextLayer {}

impl Drop for PdfiumTextLayer {
    fn drop(&mut self) {
        unsafe {
            FPDFText_ClosePage(self.handle);
        }
    }
}

impl TextLayerBackend for PdfiumTextLayer {
    fn char_count(&self) -> usize {
        // SAFETY: live text page handle.
        usize::try_from(unsafe { FPDFText_CountChars(self.handle) }).unwrap_or(0)
    }

    fn rect_count(&self) -> usize {
        // SAFETY: live text page handle; -1 counts to the end.
        usize::try_from(unsafe { FPDFText_CountRects(self.handle, 0, -1) }).unwrap_or(0)
    }

    fn unicode(&self, index: usize) -> u32 {
        let Ok(index) = c_int::try_from(index) else {
            return 0;
        };
        // SAFETY: live text page handle; PDFium range-checks the index.
        unsafe { FPDFText_GetUnicode(self.handle, index) }
    }

    fn char_box(&self, index: usize) -> Option<PageRect> {
        let index = c_int::try_from(index).ok()?;
        let (mut left, mut right, mut bottom, mut top) = (0.0, 0.0, 0.0, 0.0);
        // SAFETY: out-pointers point at locals.
        let ok = unsafe { FPDFText_GetCharBox(self.handle, index, &mut left, &mut right, &mut bottom, &mut top) };
        (ok != 0).then(|| PageRect::new(left, top, right, bottom))
    }

    fn loose_char_box(&self, index: usize) -> Option<PageRect> {
        let index = c_int::try_from(index).ok()?;
        let mut rect = FS_RECTF::default();
        // SAFETY: out-pointer points at a local.
        let ok = unsafe { FPDFText_GetLooseCharBox(self.handle, index, &mut rect) };
        (ok != 0).then(|| {
            PageRect::new(
                f64::from(rect.left),
                f64::from(rect.top),
                f64::from(rect.right),
                f64::from(rect.bottom),
            )
        })
    }

    fn rect(&self, index: usize) -> Option<PageRect> {
        let index = c_int::try_from(index).ok()?;
        let (mut left, mut top, mut right, mut bottom) = (0.0, 0.0, 0.0, 0.0);
        // SAFETY: out-pointers point at locals.
        let ok = unsafe { FPDFText_GetRect(self.handle, index, &mut left, &mut top, &mut right, &mut bottom) };
        (ok != 0).then(|| PageRect::new(left, top, right, bottom))
    }
}
