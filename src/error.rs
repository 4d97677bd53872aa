//! Error types for the doctype-classifier library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`DocClassError`] — **Fatal**: the request cannot proceed at all
//!   (taxonomy file unreadable, unsupported upload, provider not configured,
//!   text could not be extracted). Returned as `Err(DocClassError)`.
//!
//! * [`GenerationError`] — the text-generation call failed. It never leaves
//!   [`crate::classify::Classifier::classify`]: the classifier turns it into
//!   the `"Error"` sentinel result so callers always receive a record.
//!
//! * [`PageError`] — **Non-fatal**: OCR of a single PDF page failed. The page
//!   contributes no text but the rest of the document is still classified.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doctype-classifier library.
#[derive(Debug, Error)]
pub enum DocClassError {
    // ── Taxonomy errors ───────────────────────────────────────────────────
    /// Taxonomy definition file was not found.
    #[error("File '{path}' not found.")]
    TaxonomyNotFound { path: PathBuf },

    /// Taxonomy definition could not be decoded.
    #[error("JSON decoding error: Check the file format. ({detail})")]
    TaxonomyParse { detail: String },

    /// Taxonomy decoded fine but lists no document types.
    #[error("Taxonomy defines no document types")]
    EmptyTaxonomy,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input is neither a PDF nor a supported image.
    #[error("Please provide a valid PDF or image.")]
    UnsupportedFileType { name: String },

    /// The file claims to be a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The image could not be decoded or re-encoded.
    #[error("Image '{path}' could not be decoded: {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    /// The document yielded no text at all (text layer empty and OCR failed).
    #[error("No text could be extracted from '{path}'")]
    NoTextExtracted { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocClassError {
    /// Whether the error was caused by the caller's input rather than by
    /// this service or one of its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocClassError::UnsupportedFileType { .. } | DocClassError::NotAPdf { .. }
        )
    }
}

/// Failure of the external text-generation capability.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The provider returned an error (network, auth, quota, bad request).
    #[error("{0}")]
    Provider(String),

    /// The provider answered but the completion was empty.
    #[error("the model returned an empty response")]
    EmptyResponse,
}

/// A non-fatal error for a single PDF page.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// OCR call failed after retries.
    #[error("Page {page}: OCR failed after {retries} retries: {detail}")]
    OcrFailed {
        page: usize,
        retries: u32,
        detail: String,
    },
}
