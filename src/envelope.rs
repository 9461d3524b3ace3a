//! Result envelope construction and file metadata attachment.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::models::{
    FileMeta, IngestMeta, IngestionResult, InputType, LlmMode, NoiseLevel, SourceMeta,
    TextDensity, Warning, Warnings, SCHEMA_VERSION,
};
use crate::quality::Assessment;

/// Builds [`IngestionResult`] values for one input type.
#[derive(Debug, Clone)]
pub struct Envelope {
    input_type: InputType,
    page_count: u32,
    source_meta: Option<SourceMeta>,
}

impl Envelope {
    pub fn new(input_type: InputType) -> Self {
        Self {
            input_type,
            page_count: 1,
            source_meta: None,
        }
    }

    pub fn page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }

    /// Record the URL the result came from. `source_type` follows the input type.
    pub fn source(mut self, url: impl Into<String>, language: impl Into<String>) -> Self {
        self.source_meta = Some(SourceMeta {
            source_type: self.input_type,
            url: url.into(),
            language: language.into(),
        });
        self
    }

    /// Wrap extracted text and its assessment.
    ///
    /// Empty text always yields a zero-confidence result carrying
    /// `no_text_detected` in addition to the assessment's warnings.
    pub fn build(self, text: String, assessment: Assessment) -> IngestionResult {
        if text.is_empty() {
            let mut warnings = assessment.warnings;
            warnings.insert(Warning::NoTextDetected);
            return self.empty(warnings);
        }

        IngestionResult {
            schema_version: SCHEMA_VERSION.to_string(),
            text,
            confidence: assessment.confidence.clamp(0.0, 1.0),
            warnings: assessment.warnings,
            ingest_meta: IngestMeta {
                input_type: self.input_type,
                page_count: self.page_count,
                noise_level: assessment.noise_level,
                recommended_llm_mode: assessment.recommended_llm_mode,
                text_density: assessment.text_density,
                avg_chars_per_page: assessment.avg_chars_per_page,
            },
            source_meta: self.source_meta,
            file_meta: None,
        }
    }

    /// A zero-confidence result with no text.
    pub fn empty(self, warnings: impl Into<Warnings>) -> IngestionResult {
        let mut warnings = warnings.into();
        if warnings.is_empty() {
            warnings.insert(Warning::NoTextDetected);
        }

        IngestionResult {
            schema_version: SCHEMA_VERSION.to_string(),
            text: String::new(),
            confidence: 0.0,
            warnings,
            ingest_meta: IngestMeta {
                input_type: self.input_type,
                page_count: self.page_count,
                noise_level: NoiseLevel::High,
                recommended_llm_mode: LlmMode::Strict,
                text_density: TextDensity::Low,
                avg_chars_per_page: 0,
            },
            source_meta: self.source_meta,
            file_meta: None,
        }
    }
}

/// Compute SHA-256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Gather file metadata for a path on disk.
///
/// `origin` is recorded as given; archive members use `archive!/member`.
pub async fn file_meta(path: &Path, origin: impl Into<String>) -> std::io::Result<FileMeta> {
    let content = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(FileMeta {
        origin: origin.into(),
        file_name,
        extension,
        size_bytes: content.len() as u64,
        mime_type,
        sha256: compute_hash(&content),
        ingested_at: Utc::now(),
    })
}
