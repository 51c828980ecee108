//! Comprehensive tests for pdfium-view
//!
//! Tests cover:
//! - Document loading, locking and unlocking
//! - Page resource management (lazy handles, caches, teardown)
//! - Text layout reconstruction
//! - Link and destination resolution
//! - Outline synopsis and document metadata
//! - Viewer sessions and library reference counting
//! - Image export

use chrono::{Datelike, Timelike};
use pdfium_view::backend::memory::{MemoryBackend, MemoryBookmark, MemoryDocument, MemoryPage};
use pdfium_view::{
    active_count, Destination, Document, LinkAnnotation, LinkTarget, MetaDataKey, MetaDataValue, NormalizedPoint,
    NormalizedRect, PageMode, PageRect, PageSize, PdfError, PixelRect, PixmapRequest, Rotation, Session,
    SessionConfig, Viewport,
};
use serial_test::serial;
use std::sync::Arc;
use tempfile::tempdir;

fn letter() -> MemoryPage {
    MemoryPage::new(PageSize::new(612.0, 792.0))
}

/// Four-page document: text on page 0, a link from page 1 to page 3.
fn sample_document() -> MemoryDocument {
    let text_page = letter()
        .with_text_line("AB\r\n", 100.0, 700.0, 10.0, 12.0)
        .with_text_line("C", 100.0, 680.0, 10.0, 12.0)
        .with_label("i");
    let link_page = letter().with_link(LinkAnnotation {
        destination: Some(Destination::at(3, 100.0, 200.0)),
        uri: None,
        rect: Some(PageRect::new(72.0, 720.0, 144.0, 700.0)),
    });
    MemoryDocument::new()
        .with_page(text_page)
        .with_page(link_page)
        .with_page(MemoryPage::new(PageSize::new(595.0, 842.0)))
        .with_page(letter())
        .with_meta("Title", "Sample")
        .with_meta("Author", "Jane Doe")
        .with_meta("CreationDate", "D:20240115103000+02'00'")
        .with_meta("ModDate", "garbage")
        .with_page_mode(PageMode::UseOutlines)
        .with_bookmark(
            MemoryBookmark::new("Intro", Some(Destination::page(0)))
                .with_child(MemoryBookmark::new("Links", Some(Destination::page(1)))),
        )
        .with_bookmark(MemoryBookmark::new("End", Some(Destination::at(3, 0.0, 0.0))))
}

fn backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_document("sample.pdf", sample_document())
            .with_document("secret.pdf", sample_document().with_password("hunter2"))
            .with_document("broken.pdf", MemoryDocument::new().corrupt()),
    )
}

// ============================================================================
// Document Loading Tests
// ============================================================================

#[test]
fn test_load_document() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    assert!(!doc.is_locked());
    assert_eq!(doc.page_count(), 4);
    assert_eq!(doc.page_label(0).as_deref(), Some("i"));
    assert_eq!(doc.page_size(2), Some(PageSize::new(595.0, 842.0)));
}

#[test]
fn test_load_errors() {
    match Document::load(backend(), "missing.pdf", None) {
        Err(PdfError::FileNotFound(_)) => {}
        other => panic!("Expected FileNotFound, got {:?}", other),
    }
    match Document::load(backend(), "broken.pdf", None) {
        Err(PdfError::OpenFailed { .. }) => {}
        other => panic!("Expected OpenFailed, got {:?}", other),
    }
}

#[test]
fn test_encrypted_document_unlock() {
    let mut doc = Document::load(backend(), "secret.pdf", None).unwrap();
    assert!(doc.is_locked());
    assert_eq!(doc.page_count(), 0);
    assert!(matches!(doc.page(0), Err(PdfError::DocumentLocked)));
    assert!(doc.synopsis().is_empty());

    assert!(!doc.unlock("wrong"));
    assert!(doc.is_locked());

    assert!(doc.unlock("hunter2"));
    assert_eq!(doc.page_count(), 4);
    assert_eq!(doc.synopsis().len(), 3);
    assert!(doc.page(0).is_ok());
}

#[test]
fn test_page_index_out_of_bounds() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    match doc.page(4) {
        Err(PdfError::PageIndexOutOfBounds { index: 4, count: 4 }) => {}
        other => panic!("Expected PageIndexOutOfBounds, got {:?}", other.map(|p| p.index())),
    };
}

// ============================================================================
// Page Resource Tests
// ============================================================================

#[test]
fn test_geometry_without_handles() {
    let backend = backend();
    let doc = Document::load(Arc::clone(&backend), "sample.pdf", None).unwrap();
    let page = doc.page(2).unwrap();
    assert_eq!(page.size(), PageSize::new(595.0, 842.0));
    assert!(!page.is_loaded());
    assert_eq!(backend.stats().page_loads(), 0);
}

#[test]
fn test_image_cache_single_slot() {
    let backend = backend();
    let stats = backend.stats();
    let doc = Document::load(backend, "sample.pdf", None).unwrap();
    let page = doc.page(0).unwrap();

    let first = page.image(200, 300);
    let again = page.image(200, 300);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(stats.renders(), 1);

    let other = page.image(100, 150);
    assert_eq!(other.size(), (100, 150));
    assert_eq!(stats.renders(), 2);

    // The slot now holds 100x150; the first size renders again.
    let third = page.image(200, 300);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(stats.renders(), 3);
}

#[test]
fn test_handles_released_on_drop() {
    let backend = backend();
    let stats = backend.stats();
    let doc = Document::load(backend, "sample.pdf", None).unwrap();
    {
        let page = doc.page(0).unwrap();
        assert_eq!(page.characters().len(), 5);
        assert!(page.is_loaded());
        assert_eq!(stats.live_handles(), (1, 1));
    }
    assert_eq!(stats.live_handles(), (0, 0));
}

#[test]
fn test_pages_shared_across_threads() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let page = doc.page(0).unwrap();
    let counts: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| page.characters().len())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![5; 4]);
}

// ============================================================================
// Text Layout Tests
// ============================================================================

#[test]
fn test_text_layout_line_breaks() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let page = doc.page(0).unwrap();
    let chars = page.characters();

    let text: String = chars.iter().map(|c| c.text).collect();
    assert_eq!(text, "AB\r\nC");
    assert_eq!(chars[1].area, PixelRect::new(110, 92, 120, 104));
    // Line-break characters take a one-pixel sliver at the end of the previous box.
    assert_eq!(chars[2].area, PixelRect::new(119, 92, 120, 104));
    assert_eq!(chars[3].area, PixelRect::new(119, 92, 120, 104));
    assert_eq!(chars[4].area, PixelRect::new(100, 112, 110, 124));
}

#[test]
fn test_par_characters() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let results = doc.par_characters(&[0, 1, 9]);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, 0);
    assert_eq!(results[0].1.len(), 5);
    assert!(results[1].1.is_empty());
    assert!(results[2].1.is_empty());
}

// ============================================================================
// Link Tests
// ============================================================================

#[test]
fn test_link_to_later_page() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let page = doc.page(1).unwrap();
    assert!(page.has_links());

    let links = page.links();
    assert_eq!(links.len(), 1);
    let LinkTarget::Internal { viewport } = &links[0].target else {
        panic!("expected an internal link");
    };
    assert_eq!(viewport.page, 3);
    assert_eq!(
        viewport.position,
        Some(NormalizedPoint::new(100.0 / 612.0, 592.0 / 792.0))
    );

    let rect = links[0].rect;
    assert!((rect.left - 72.0 / 612.0).abs() < 1e-12);
    assert!((rect.top - 72.0 / 792.0).abs() < 1e-12);
    assert!((rect.right - 144.0 / 612.0).abs() < 1e-12);
    assert!((rect.bottom - 92.0 / 792.0).abs() < 1e-12);
}

#[test]
fn test_links_computed_once() {
    let backend = backend();
    let stats = backend.stats();
    let doc = Document::load(backend, "sample.pdf", None).unwrap();
    let page = doc.page(1).unwrap();

    let first = page.links();
    let second = page.links();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(stats.link_enumerations(), 1);

    let empty = doc.page(0).unwrap();
    assert!(!empty.has_links());
    assert!(empty.links().is_empty());
}

// ============================================================================
// Outline and Metadata Tests
// ============================================================================

#[test]
fn test_synopsis() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let synopsis = doc.synopsis();
    let titles: Vec<&str> = synopsis.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Intro", "Links", "End"]);
    assert!(synopsis.entries[0].open);
    assert!(!synopsis.entries[0].children[0].open);

    // An explicit (0, 0) location is the bottom-left corner of the page.
    let end = synopsis.entries[1].viewport.unwrap();
    assert_eq!(end.position, Some(NormalizedPoint::new(0.0, 1.0)));

    let json = serde_json::to_value(synopsis).unwrap();
    assert_eq!(json["entries"][0]["title"], "Intro");
    assert_eq!(json["entries"][0]["children"][0]["viewport"]["page"], 1);
}

#[test]
fn test_document_info() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let info = doc.document_info();
    assert_eq!(info.title.as_deref(), Some("Sample"));
    assert_eq!(info.author.as_deref(), Some("Jane Doe"));
    assert_eq!(info.subject, None);
    assert_eq!(info.pages, 4);
    assert_eq!(info.mime_type, "application/pdf");

    let created = info.creation_date.unwrap();
    assert_eq!((created.year(), created.month(), created.day()), (2024, 1, 15));
    assert_eq!(created.hour(), 10);
    assert_eq!(created.offset().local_minus_utc(), 2 * 3600);
    assert!(info.modification_date.is_none());

    assert!(doc.open_toc());
    assert!(!doc.start_full_screen());
}

// ============================================================================
// Session Tests
// ============================================================================

#[test]
#[serial]
fn test_library_refcount() {
    let backend = backend();
    let base = active_count();

    let first = Session::new(Arc::clone(&backend), SessionConfig::new());
    let second = Session::new(Arc::clone(&backend), SessionConfig::new());
    assert_eq!(active_count(), base + 2);

    drop(first);
    assert_eq!(active_count(), base + 1);
    drop(second);
    assert_eq!(active_count(), base);
}

#[test]
#[serial]
fn test_session_round_trip() {
    let mut session = Session::new(backend(), SessionConfig::new().set_dpi(96.0, 96.0));
    assert!(session.load_document("sample.pdf", None).is_success());

    let layouts = session.page_layouts();
    assert_eq!(layouts.len(), 4);
    assert_eq!(layouts[0].width, 816.0);
    assert_eq!(layouts[0].orientation, Rotation::None);

    let text = session.text_page(0).unwrap();
    assert_eq!(text.text(), "AB\r\nC");
    assert!(text.links.is_none());

    let links = session.text_page(1).unwrap().links.unwrap();
    assert_eq!(links[0].page(), Some(3));

    let tile = session.image(
        &PixmapRequest::new(0, 816, 1056).with_tile(NormalizedRect::new(0.5, 0.5, 1.0, 1.0)),
        || false,
    );
    assert_eq!(tile.size(), (408, 528));

    assert_eq!(
        session.meta_data(MetaDataKey::DocumentTitle),
        Some(MetaDataValue::Text("Sample".to_string()))
    );
    assert_eq!(session.synopsis().map(|s| s.len()), Some(3));

    let json = serde_json::to_value(&session.page_layouts()[0]).unwrap();
    assert_eq!(json["label"], "i");
    assert_eq!(json["orientation"], "None");

    session.close_document();
    assert!(session.page_layouts().is_empty());
    assert!(session.document().is_none());
}

#[test]
#[serial]
fn test_session_named_viewport() {
    let backend = Arc::new(MemoryBackend::new().with_document(
        "named.pdf",
        MemoryDocument::new()
            .with_page(letter())
            .with_named_destination("top", Destination::at(0, 0.0, 792.0)),
    ));
    let mut session = Session::new(backend, SessionConfig::new());
    assert!(session.load_document("named.pdf", None).is_success());
    let expected = Viewport {
        page: 0,
        position: Some(NormalizedPoint::new(0.0, 0.0)),
    };
    assert_eq!(
        session.meta_data(MetaDataKey::NamedViewport("top")),
        Some(MetaDataValue::Viewport(expected))
    );
    assert!(session.meta_data(MetaDataKey::NamedViewport("")).is_none());
}

// ============================================================================
// Image Export Tests
// ============================================================================

#[test]
fn test_save_png_and_jpeg() {
    let doc = Document::load(backend(), "sample.pdf", None).unwrap();
    let image = doc.page(0).unwrap().image(61, 79);
    assert!(!image.is_empty());

    let dir = tempdir().unwrap();
    let png_path = dir.path().join("page.png");
    image.save_as_png(&png_path).unwrap();
    let png = std::fs::read(&png_path).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let jpeg_path = dir.path().join("page.jpg");
    image.save_as_jpeg(&jpeg_path, 85).unwrap();
    let jpeg = std::fs::read(&jpeg_path).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}
