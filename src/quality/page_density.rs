//! Quality heuristic for OCR output (images and PDFs).

use tracing::debug;

use super::{round_confidence, Artifact, Assessment, Assessor, Sample};
use crate::models::{LlmMode, NoiseLevel, TextDensity, Warning, Warnings};

/// Tunables for [`PageDensityAssessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageDensityThresholds {
    /// Texts shorter than this many characters get `short_text`.
    pub min_chars: usize,
    pub short_text_penalty: f64,
    /// Symbol ratio above which text is flagged as noisy.
    pub max_symbol_ratio: f64,
    pub noisy_text_penalty: f64,
    /// Rasters narrower or shorter than this get `low_resolution`.
    pub min_dimension: u32,
    pub low_resolution_penalty: f64,
    /// Confidence strictly above this is `low` noise / `creative`.
    pub creative_above: f64,
    /// Confidence strictly above this is `medium` noise / `normal`.
    pub normal_above: f64,
    pub high_density_above: usize,
    pub medium_density_above: usize,
}

impl Default for PageDensityThresholds {
    fn default() -> Self {
        Self {
            min_chars: 100,
            short_text_penalty: 0.3,
            max_symbol_ratio: 0.25,
            noisy_text_penalty: 0.4,
            min_dimension: 800,
            low_resolution_penalty: 0.2,
            creative_above: 0.8,
            normal_above: 0.5,
            high_density_above: 2500,
            medium_density_above: 800,
        }
    }
}

/// Additive-deduction heuristic for OCR text.
#[derive(Debug, Clone, Default)]
pub struct PageDensityAssessor {
    thresholds: PageDensityThresholds,
}

impl PageDensityAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Noise level and mode are both a function of confidence alone.
    pub fn classify(&self, confidence: f64) -> (NoiseLevel, LlmMode) {
        if confidence > self.thresholds.creative_above {
            (NoiseLevel::Low, LlmMode::Creative)
        } else if confidence > self.thresholds.normal_above {
            (NoiseLevel::Medium, LlmMode::Normal)
        } else {
            (NoiseLevel::High, LlmMode::Strict)
        }
    }

    pub fn density(&self, avg_chars_per_page: usize) -> TextDensity {
        if avg_chars_per_page > self.thresholds.high_density_above {
            TextDensity::High
        } else if avg_chars_per_page > self.thresholds.medium_density_above {
            TextDensity::Medium
        } else {
            TextDensity::Low
        }
    }
}

/// Share of characters that are neither alphanumeric nor whitespace.
fn symbol_ratio(text: &str, len: usize) -> f64 {
    let symbols = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();
    symbols as f64 / len.max(1) as f64
}

impl Assessor for PageDensityAssessor {
    fn name(&self) -> &'static str {
        "page_density"
    }

    fn assess(&self, sample: &Sample<'_>) -> Assessment {
        let t = &self.thresholds;
        let len = sample.char_len();
        let mut confidence = 1.0;
        let mut warnings = Warnings::new();

        if len < t.min_chars {
            warnings.insert(Warning::ShortText);
            confidence -= t.short_text_penalty;
        }

        if symbol_ratio(sample.text, len) > t.max_symbol_ratio {
            warnings.insert(Warning::LowConfidenceText);
            confidence -= t.noisy_text_penalty;
        }

        if let Artifact::Raster { width, height } = sample.artifact {
            if width < t.min_dimension || height < t.min_dimension {
                warnings.insert(Warning::LowResolution);
                confidence -= t.low_resolution_penalty;
            }
        }

        let confidence = round_confidence(confidence);
        let (noise_level, recommended_llm_mode) = self.classify(confidence);
        let avg_chars_per_page = len / sample.page_count.max(1) as usize;

        debug!(
            assessor = self.name(),
            len,
            confidence,
            warnings = warnings.len(),
            "Assessed OCR text"
        );

        Assessment {
            confidence,
            warnings,
            noise_level,
            recommended_llm_mode,
            text_density: self.density(avg_chars_per_page),
            avg_chars_per_page,
        }
    }
}
