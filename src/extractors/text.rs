//! Plain-text passthrough.

use std::path::Path;

use crate::envelope::Envelope;
use crate::models::{IngestionResult, InputType, LlmMode, NoiseLevel, TextDensity, Warning, Warnings};
use crate::quality::Assessment;

/// Texts longer than this many characters are classified `high` density.
const HIGH_DENSITY_ABOVE: usize = 1500;

/// Reads text files without OCR.
#[derive(Debug, Clone, Default)]
pub struct TextPassthrough;

impl TextPassthrough {
    pub async fn extract(&self, path: &Path) -> std::io::Result<IngestionResult> {
        let bytes = tokio::fs::read(path).await?;
        Ok(passthrough(&bytes))
    }
}

/// Decode (dropping invalid UTF-8 sequences), trim and classify.
///
/// Feeding a result's text back in yields an equal result.
pub fn passthrough(bytes: &[u8]) -> IngestionResult {
    let decoded: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    let text = decoded.trim().to_string();

    let envelope = Envelope::new(InputType::Text);
    if text.is_empty() {
        return envelope.empty(Warning::NoTextDetected);
    }

    let len = text.chars().count();
    let assessment = Assessment {
        confidence: 1.0,
        warnings: Warnings::new(),
        noise_level: NoiseLevel::Low,
        recommended_llm_mode: LlmMode::Creative,
        text_density: if len > HIGH_DENSITY_ABOVE {
            TextDensity::High
        } else {
            TextDensity::Medium
        },
        avg_chars_per_page: len,
    };
    envelope.build(text, assessment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bytes_dropped_and_trimmed() {
        let result = passthrough(b"  caf\xc3\xa9 \xff\xfe ok \n");
        assert_eq!(result.text(), "café  ok");
        assert_eq!(result.confidence(), 1.0);
        assert_eq!(result.meta().text_density, TextDensity::Medium);
        assert_eq!(result.meta().avg_chars_per_page, 8);
    }

    #[test]
    fn test_long_text_is_high_density() {
        let body = "a".repeat(1501);
        let result = passthrough(body.as_bytes());
        assert_eq!(result.meta().text_density, TextDensity::High);
        assert_eq!(result.meta().recommended_llm_mode, LlmMode::Creative);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let result = passthrough(b" \n\t ");
        assert_eq!(result.confidence(), 0.0);
        assert!(result.warnings().contains("no_text_detected"));
        assert_eq!(result.meta().input_type, InputType::Text);
    }

    #[test]
    fn test_idempotent() {
        let first = passthrough("  some notes\r\nwith lines  ".as_bytes());
        let second = passthrough(first.text().as_bytes());
        assert_eq!(first, second);
    }
}
