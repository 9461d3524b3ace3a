//! Warning taxonomy attached to ingestion results.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single warning code.
///
/// Content-quality signals, per-page gaps and network/transcript failures all
/// surface here instead of as errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Warning {
    /// Extracted text is shorter than the assessor's minimum.
    ShortText,
    /// Symbol-to-text ratio suggests garbled OCR output.
    LowConfidenceText,
    /// Source raster is below the resolution OCR handles well.
    LowResolution,
    /// Nothing was extracted at all.
    NoTextDetected,
    /// A single PDF page produced no text (1-based page number).
    NoTextPage(u32),
    /// Web page body is suspiciously short.
    ShortContent,
    /// Web page contained no text after boilerplate was stripped.
    EmptyPageContent,
    HttpError(u16),
    ConnectionTimeout,
    ConnectionError,
    ScrapeError(String),
    InvalidYoutubeUrl,
    NoEnglishTranscript,
    TranscriptsDisabled,
    NoTranscriptFound,
    YoutubeError(String),
}

impl Warning {
    /// The wire code for this warning.
    pub fn code(&self) -> String {
        match self {
            Self::ShortText => "short_text".to_string(),
            Self::LowConfidenceText => "low_confidence_text".to_string(),
            Self::LowResolution => "low_resolution".to_string(),
            Self::NoTextDetected => "no_text_detected".to_string(),
            Self::NoTextPage(page) => format!("no_text_page_{}", page),
            Self::ShortContent => "short_content".to_string(),
            Self::EmptyPageContent => "empty_page_content".to_string(),
            Self::HttpError(status) => format!("http_error_{}", status),
            Self::ConnectionTimeout => "connection_timeout".to_string(),
            Self::ConnectionError => "connection_error".to_string(),
            Self::ScrapeError(detail) => format!("scrape_error: {}", detail),
            Self::InvalidYoutubeUrl => "invalid_youtube_url".to_string(),
            Self::NoEnglishTranscript => "no_english_transcript".to_string(),
            Self::TranscriptsDisabled => "transcripts_disabled".to_string(),
            Self::NoTranscriptFound => "no_transcript_found".to_string(),
            Self::YoutubeError(detail) => format!("youtube_error: {}", detail),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Set of warning codes. Duplicates collapse; serialized in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warnings(BTreeSet<String>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, warning: Warning) {
        self.0.insert(warning.code());
    }

    /// Set union with another warning set.
    pub fn merge(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn has(&self, warning: &Warning) -> bool {
        self.0.contains(&warning.code())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl From<Warning> for Warnings {
    fn from(warning: Warning) -> Self {
        let mut set = Self::new();
        set.insert(warning);
        set
    }
}

impl FromIterator<Warning> for Warnings {
    fn from_iter<I: IntoIterator<Item = Warning>>(iter: I) -> Self {
        let mut set = Self::new();
        for warning in iter {
            set.insert(warning);
        }
        set
    }
}
