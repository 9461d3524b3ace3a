//! The uniform ingestion result envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::warning::Warnings;

/// Schema tag written into every result.
pub const SCHEMA_VERSION: &str = "1.3";

/// How noisy the extracted text is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    Low,
    Medium,
    High,
}

impl NoiseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// How much creative latitude a downstream generator can safely take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    Creative,
    Normal,
    Strict,
}

impl LlmMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "creative",
            Self::Normal => "normal",
            Self::Strict => "strict",
        }
    }
}

/// Amount of content recovered per logical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDensity {
    Low,
    Medium,
    High,
}

impl TextDensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// What kind of artifact produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Image,
    Pdf,
    Text,
    WebPage,
    Youtube,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::WebPage => "web_page",
            Self::Youtube => "youtube",
        }
    }
}

/// Classification block consumed by the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestMeta {
    pub input_type: InputType,
    pub page_count: u32,
    pub noise_level: NoiseLevel,
    pub recommended_llm_mode: LlmMode,
    pub text_density: TextDensity,
    pub avg_chars_per_page: usize,
}

/// Origin details for URL-derived results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub source_type: InputType,
    pub url: String,
    pub language: String,
}

/// File details attached after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Absolute path, or `archive!/member` for archive members.
    pub origin: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub mime_type: String,
    pub sha256: String,
    pub ingested_at: DateTime<Utc>,
}

/// One extraction attempt, normalized.
///
/// Values are immutable once built; use [`IngestionResult::with_file_meta`]
/// to produce a decorated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub(crate) schema_version: String,
    pub(crate) text: String,
    #[serde(rename = "overall_confidence", alias = "confidence")]
    pub(crate) confidence: f64,
    pub(crate) warnings: Warnings,
    pub(crate) ingest_meta: IngestMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) source_meta: Option<SourceMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) file_meta: Option<FileMeta>,
}

impl IngestionResult {
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn meta(&self) -> &IngestMeta {
        &self.ingest_meta
    }

    pub fn source_meta(&self) -> Option<&SourceMeta> {
        self.source_meta.as_ref()
    }

    pub fn file_meta(&self) -> Option<&FileMeta> {
        self.file_meta.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Decorate with file metadata. Text, confidence and warnings are untouched.
    pub fn with_file_meta(self, file_meta: FileMeta) -> Self {
        Self {
            file_meta: Some(file_meta),
            ..self
        }
    }
}
