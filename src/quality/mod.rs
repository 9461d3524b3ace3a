//! Extraction quality assessment.
//!
//! Two independently tuned heuristics share the [`Assessor`] capability:
//! - [`PageDensityAssessor`]: OCR output from images and PDFs, deducting for
//!   short text, symbol noise and low source resolution
//! - [`WebContentAssessor`]: scraped page bodies and transcripts, with its own
//!   density cutoffs and mode rules
//!
//! Their thresholds are deliberately kept in separate parameter structs.

mod page_density;
mod web_content;

pub use page_density::{PageDensityAssessor, PageDensityThresholds};
pub use web_content::{WebContentAssessor, WebContentThresholds};

use crate::models::{LlmMode, NoiseLevel, TextDensity, Warnings};

/// The artifact the text was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// A decoded raster image with its original dimensions.
    Raster { width: u32, height: u32 },
    /// A multi-page document; resolution is not re-checked at this level.
    Document,
    /// Remote content (web page body, transcript).
    Remote,
}

/// Input to an assessor.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub text: &'a str,
    pub artifact: Artifact,
    pub page_count: u32,
}

impl<'a> Sample<'a> {
    pub fn new(text: &'a str, artifact: Artifact, page_count: u32) -> Self {
        Self {
            text,
            artifact,
            page_count,
        }
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Output of an assessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub confidence: f64,
    pub warnings: Warnings,
    pub noise_level: NoiseLevel,
    pub recommended_llm_mode: LlmMode,
    pub text_density: TextDensity,
    pub avg_chars_per_page: usize,
}

/// A quality heuristic for one family of sources.
pub trait Assessor: Send + Sync {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Score a sample. Pure: same input, same output.
    fn assess(&self, sample: &Sample<'_>) -> Assessment;
}

/// Round to two decimals and clamp into [0, 1].
pub fn round_confidence(raw: f64) -> f64 {
    ((raw * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(1.0 - 0.3 - 0.4 - 0.2), 0.1);
        assert_eq!(round_confidence(-0.4), 0.0);
        assert_eq!(round_confidence(0.666), 0.67);
    }

    #[test]
    fn test_char_len_counts_scalars() {
        let sample = Sample::new("héllo", Artifact::Document, 1);
        assert_eq!(sample.char_len(), 5);
    }
}
