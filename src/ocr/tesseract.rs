//! Tesseract OCR backend.
//!
//! Runs the `tesseract` command-line tool on an already normalized image.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tracing::debug;

use super::backend::{OcrBackend, OcrConfig, OcrError, OcrResult};
use crate::tools::check_binary;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable("tesseract".to_string()))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_tesseract(image_path)?;
        let elapsed = start.elapsed();

        debug!(
            path = %image_path.display(),
            chars = text.len(),
            ms = elapsed.as_millis() as u64,
            "tesseract finished"
        );

        Ok(OcrResult {
            text,
            backend: self.name(),
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}
