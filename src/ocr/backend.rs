//! OCR backend abstraction.
//!
//! The pipeline only needs "image file in, text out"; the concrete engine is
//! injected so tests and alternative engines can replace the Tesseract CLI.

use std::path::Path;
use thiserror::Error;

/// Errors from OCR backends and page rasterizers.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Rasterization failed: {0}")]
    RasterFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Extracted text content, untrimmed.
    pub text: String,
    /// Which backend produced this result.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Run OCR on an image file.
    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError>;
}

/// Configuration for OCR backends.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "deu").
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }
}
