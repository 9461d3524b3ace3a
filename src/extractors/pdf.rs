//! Page-by-page PDF OCR.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info};

use super::ocr_page;
use crate::envelope::Envelope;
use crate::error::IngestError;
use crate::models::{IngestionResult, InputType, Warning, Warnings};
use crate::ocr::{ImageNormalizer, OcrBackend, PageRasterizer};
use crate::quality::{Artifact, Assessor, PageDensityAssessor, Sample};

/// Rasterize every page, OCR each one and assess the joined text.
#[derive(Clone)]
pub struct PdfExtractor {
    normalizer: ImageNormalizer,
    ocr: Arc<dyn OcrBackend>,
    rasterizer: Arc<dyn PageRasterizer>,
    dpi: u32,
    assessor: PageDensityAssessor,
}

impl PdfExtractor {
    pub fn new(
        normalizer: ImageNormalizer,
        ocr: Arc<dyn OcrBackend>,
        rasterizer: Arc<dyn PageRasterizer>,
        dpi: u32,
    ) -> Self {
        Self {
            normalizer,
            ocr,
            rasterizer,
            dpi,
            assessor: PageDensityAssessor::new(),
        }
    }

    pub async fn extract(&self, path: &Path) -> Result<IngestionResult, IngestError> {
        let pdf: PathBuf = path.to_path_buf();
        let normalizer = self.normalizer.clone();
        let ocr = Arc::clone(&self.ocr);
        let rasterizer = Arc::clone(&self.rasterizer);
        let dpi = self.dpi;

        let pages = tokio::task::spawn_blocking(move || -> Result<Vec<String>, IngestError> {
            // Page rasters live only as long as this call.
            let scratch = TempDir::new()?;
            let images = rasterizer.rasterize(&pdf, dpi, scratch.path())?;

            let mut texts = Vec::with_capacity(images.len());
            for (index, image) in images.iter().enumerate() {
                let bytes = std::fs::read(image)?;
                let page = ocr_page(&normalizer, ocr.as_ref(), &bytes)?;
                debug!(page = index + 1, chars = page.text.len(), "OCR page");
                texts.push(page.text);
            }
            Ok(texts)
        })
        .await??;

        Ok(self.assemble(pages))
    }

    /// Join per-page OCR output into one result.
    pub fn assemble(&self, pages: Vec<String>) -> IngestionResult {
        let page_count = pages.len() as u32;
        let mut page_warnings = Warnings::new();
        let mut kept = Vec::with_capacity(pages.len());

        for (index, text) in pages.into_iter().enumerate() {
            if text.is_empty() {
                page_warnings.insert(Warning::NoTextPage(index as u32 + 1));
            } else {
                kept.push(text);
            }
        }

        let envelope = Envelope::new(InputType::Pdf).page_count(page_count);
        let full_text = kept.join("\n\n");
        if full_text.is_empty() {
            info!(pages = page_count, "No text recovered from any PDF page");
            return envelope.empty(Warning::NoTextDetected);
        }

        let mut assessment =
            self.assessor
                .assess(&Sample::new(&full_text, Artifact::Document, page_count));
        assessment.warnings.merge(page_warnings);
        envelope.build(full_text, assessment)
    }
}
