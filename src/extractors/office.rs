//! Office documents.
//!
//! No converter to PDF is wired in, so these fail fast instead of guessing.

use std::path::Path;

use crate::error::IngestError;
use crate::models::IngestionResult;

#[derive(Debug, Clone, Default)]
pub struct OfficeExtractor;

impl OfficeExtractor {
    pub async fn extract(&self, path: &Path) -> Result<IngestionResult, IngestError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "office".to_string());
        Err(IngestError::ConversionUnavailable(ext))
    }
}
