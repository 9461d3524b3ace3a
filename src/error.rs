//! Error types for the ingestion pipeline.
//!
//! Only input, capability and infrastructure failures are errors. Content
//! quality problems and transient network failures are reported as warnings
//! on a zero-confidence result instead.

use thiserror::Error;

use crate::ocr::OcrError;

/// Errors returned by [`crate::Ingestor::ingest`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported input kind: {0}")]
    UnsupportedKind(String),

    #[error("Conversion unavailable for {0} documents")]
    ConversionUnavailable(String),

    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Archive nesting exceeds depth limit of {0}")]
    DepthExceeded(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<OcrError> for IngestError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::BackendNotAvailable(tool) => IngestError::ToolNotFound(tool),
            OcrError::ImageError(detail) => IngestError::UnreadableImage(detail),
            OcrError::Io(e) => IngestError::Io(e),
            other => IngestError::ExtractionFailed(other.to_string()),
        }
    }
}

/// Errors from zip container handling.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive: {0}")]
    OpenFailed(String),

    #[error("Failed to extract entry {name}: {reason}")]
    ExtractFailed { name: String, reason: String },

    #[error("Archive has more than {0} entries")]
    TooManyEntries(usize),

    #[error("Archive expands beyond {0} bytes")]
    TooLarge(u64),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Failure modes of a transcript source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for this video")]
    Disabled,

    #[error("No transcript found")]
    NotFound,

    #[error("{0}")]
    Other(String),
}
