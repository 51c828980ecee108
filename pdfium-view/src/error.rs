//! Error types for pdfium-view

use thiserror::Error;

/// Result type for pdfium-view operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Error types for document-level operations.
///
/// Page-level operations never fail with one of these; they degrade to
/// empty or absent results instead.
#[derive(Error, Debug)]
pub enum PdfError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Failed to open PDF document
    #[error("Failed to open PDF document: {reason}")]
    OpenFailed { reason: String },

    /// Missing or wrong password for an encrypted PDF
    #[error("Invalid password for encrypted PDF")]
    InvalidPassword,

    /// The document is still locked and has no backend handle
    #[error("Document is locked; unlock it with the correct password first")]
    DocumentLocked,

    /// A document is already loaded in this session
    #[error("A document is already loaded; close it before loading another")]
    AlreadyLoaded,

    /// Page index out of bounds
    #[error("Page index {index} out of bounds (document has {count} pages)")]
    PageIndexOutOfBounds { index: usize, count: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error
    #[error("PNG encoding error: {0}")]
    PngEncoding(String),

    /// JPEG encoding error
    #[error("JPEG encoding error: {0}")]
    JpegEncoding(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
