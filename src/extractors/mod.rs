//! Per-kind content extractors.
//!
//! Each extractor produces raw text for one source kind and hands it to its
//! quality assessor; the archive expander re-enters the dispatcher instead.

mod archive;
mod image;
mod office;
mod pdf;
mod text;
mod video;
mod web;

pub use archive::{ArchiveExpander, ArchiveLimits, ArchiveMember};
pub use image::ImageExtractor;
pub use office::OfficeExtractor;
pub use pdf::PdfExtractor;
pub use text::{passthrough, TextPassthrough};
pub use video::{
    is_youtube_url, select_english, video_id, TranscriptSource, TranscriptTrack, VideoExtractor,
    YtDlpTranscriptSource,
};
pub use web::{collapse_whitespace, visible_text, WebExtractor};

use std::path::Path;

use tempfile::TempDir;
use tracing::debug;

use crate::error::IngestError;
use crate::ocr::{ImageNormalizer, OcrBackend};

/// OCR text of one raster plus its original dimensions.
pub(crate) struct PageText {
    pub text: String,
    pub width: u32,
    pub height: u32,
}

/// Normalize encoded image bytes, OCR them and trim the output.
///
/// Blocking; call from `spawn_blocking`. The binarized PNG lives in a scratch
/// directory dropped before returning.
pub(crate) fn ocr_page(
    normalizer: &ImageNormalizer,
    ocr: &dyn OcrBackend,
    bytes: &[u8],
) -> Result<PageText, IngestError> {
    let normalized = normalizer.normalize(bytes)?;
    let scratch = TempDir::new()?;
    let png = scratch.path().join("normalized.png");
    normalized.save_png(&png)?;

    let result = ocr.ocr_image(Path::new(&png))?;
    debug!(
        backend = result.backend,
        ms = result.processing_time_ms,
        threshold = normalized.threshold,
        "OCR pass"
    );

    Ok(PageText {
        text: result.text.trim().to_string(),
        width: normalized.original_width,
        height: normalized.original_height,
    })
}
