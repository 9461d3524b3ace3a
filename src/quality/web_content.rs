//! Quality heuristic for scraped pages and transcripts.

use super::{round_confidence, Assessment, Assessor, Sample};
use crate::models::{LlmMode, NoiseLevel, TextDensity, Warning, Warnings};

/// Tunables for [`WebContentAssessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct WebContentThresholds {
    /// Bodies shorter than this many characters get `short_content`.
    pub min_chars: usize,
    /// Confidence assigned to short bodies.
    pub short_content_confidence: f64,
    /// `creative` needs at least this confidence (and non-low density).
    pub creative_at_least: f64,
    /// Below this confidence the mode is `strict`.
    pub strict_below: f64,
    pub high_density_above: usize,
    pub medium_density_above: usize,
}

impl Default for WebContentThresholds {
    fn default() -> Self {
        Self {
            min_chars: 200,
            short_content_confidence: 0.6,
            creative_at_least: 0.9,
            strict_below: 0.8,
            high_density_above: 5000,
            medium_density_above: 1000,
        }
    }
}

/// Length-based heuristic for remote text.
#[derive(Debug, Clone, Default)]
pub struct WebContentAssessor {
    thresholds: WebContentThresholds,
}

impl WebContentAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn density(&self, len: usize) -> TextDensity {
        if len > self.thresholds.high_density_above {
            TextDensity::High
        } else if len > self.thresholds.medium_density_above {
            TextDensity::Medium
        } else {
            TextDensity::Low
        }
    }

    pub fn mode(&self, confidence: f64, density: TextDensity) -> LlmMode {
        if confidence >= self.thresholds.creative_at_least && density != TextDensity::Low {
            LlmMode::Creative
        } else if confidence < self.thresholds.strict_below {
            LlmMode::Strict
        } else {
            LlmMode::Normal
        }
    }

    pub fn noise_level(&self, confidence: f64) -> NoiseLevel {
        if confidence >= self.thresholds.creative_at_least {
            NoiseLevel::Low
        } else if confidence >= self.thresholds.strict_below {
            NoiseLevel::Medium
        } else {
            NoiseLevel::High
        }
    }

    /// Classify text whose confidence is fixed by the caller (e.g. transcripts).
    pub fn classify(&self, text: &str, confidence: f64, warnings: Warnings) -> Assessment {
        let len = text.chars().count();
        let confidence = round_confidence(confidence);
        let text_density = self.density(len);
        Assessment {
            confidence,
            warnings,
            noise_level: self.noise_level(confidence),
            recommended_llm_mode: self.mode(confidence, text_density),
            text_density,
            avg_chars_per_page: len,
        }
    }
}

impl Assessor for WebContentAssessor {
    fn name(&self) -> &'static str {
        "web_content"
    }

    fn assess(&self, sample: &Sample<'_>) -> Assessment {
        if sample.char_len() < self.thresholds.min_chars {
            self.classify(
                sample.text,
                self.thresholds.short_content_confidence,
                Warnings::from(Warning::ShortContent),
            )
        } else {
            self.classify(sample.text, 1.0, Warnings::new())
        }
    }
}
