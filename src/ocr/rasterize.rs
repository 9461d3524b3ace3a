//! PDF page rasterization.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::backend::OcrError;

/// Converts every page of a PDF into an image file.
pub trait PageRasterizer: Send + Sync {
    /// Render all pages into `output_dir`, returning image paths in page order.
    fn rasterize(&self, pdf_path: &Path, dpi: u32, output_dir: &Path)
        -> Result<Vec<PathBuf>, OcrError>;
}

/// Rasterizer backed by Poppler's `pdftoppm`.
#[derive(Debug, Clone, Default)]
pub struct PdftoppmRasterizer;

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, OcrError> {
        let output_prefix = output_dir.join("page");
        let dpi = dpi.to_string();

        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(o) if o.status.success() => {}
            Ok(o) => {
                let stderr = String::from_utf8_lossy(&o.stderr);
                return Err(OcrError::RasterFailed(format!(
                    "pdftoppm failed: {}",
                    stderr.trim()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable("pdftoppm".to_string()));
            }
            Err(e) => return Err(OcrError::Io(e)),
        }

        let pages = find_page_images(output_dir)?;
        debug!(pdf = %pdf_path.display(), pages = pages.len(), "Rasterized PDF");
        Ok(pages)
    }
}

/// Collect `page-N.png` files ordered by page number.
///
/// pdftoppm zero-pads the number to the width of the page count, so the
/// numeric suffix is parsed rather than relying on name order.
pub fn find_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let is_png = path.extension().is_some_and(|e| e == "png");
            let number = stem.strip_prefix("page-")?.parse::<u32>().ok()?;
            is_png.then_some((number, path))
        })
        .collect();

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
