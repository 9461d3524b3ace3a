//! Single-image OCR.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::ocr_page;
use crate::envelope::Envelope;
use crate::error::IngestError;
use crate::models::{IngestionResult, InputType, Warning};
use crate::ocr::{ImageNormalizer, OcrBackend};
use crate::quality::{Artifact, Assessor, PageDensityAssessor, Sample};

/// Normalize, OCR and assess one raster image.
#[derive(Clone)]
pub struct ImageExtractor {
    normalizer: ImageNormalizer,
    ocr: Arc<dyn OcrBackend>,
    assessor: PageDensityAssessor,
}

impl ImageExtractor {
    pub fn new(normalizer: ImageNormalizer, ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            normalizer,
            ocr,
            assessor: PageDensityAssessor::new(),
        }
    }

    pub async fn extract(&self, path: &Path) -> Result<IngestionResult, IngestError> {
        let bytes = tokio::fs::read(path).await?;
        let normalizer = self.normalizer.clone();
        let ocr = Arc::clone(&self.ocr);

        let page =
            tokio::task::spawn_blocking(move || ocr_page(&normalizer, ocr.as_ref(), &bytes))
                .await??;

        debug!(
            path = %path.display(),
            chars = page.text.len(),
            width = page.width,
            height = page.height,
            "OCR complete"
        );

        let envelope = Envelope::new(InputType::Image);
        if page.text.is_empty() {
            return Ok(envelope.empty(Warning::NoTextDetected));
        }

        let assessment = self.assessor.assess(&Sample::new(
            &page.text,
            Artifact::Raster {
                width: page.width,
                height: page.height,
            },
            1,
        ));
        Ok(envelope.build(page.text, assessment))
    }
}
