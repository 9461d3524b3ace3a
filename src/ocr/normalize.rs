//! Image normalization for OCR legibility.
//!
//! Steps: decode -> single-channel intensity -> upscale (cubic) -> Otsu global
//! threshold -> binary black/white. Pure; no file metadata is consulted.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use tracing::debug;

use super::backend::OcrError;

/// A binarized image plus the dimensions of the raster it came from.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub image: GrayImage,
    pub original_width: u32,
    pub original_height: u32,
    pub threshold: u8,
}

impl NormalizedImage {
    /// Write the binarized image as PNG for a path-based OCR backend.
    pub fn save_png(&self, path: &Path) -> Result<(), OcrError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| OcrError::ImageError(format!("PNG encoding failed: {e}")))
    }
}

/// Deterministic raster-to-binary preprocessor.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    upscale_factor: u32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self { upscale_factor: 2 }
    }
}

impl ImageNormalizer {
    pub fn new(upscale_factor: u32) -> Self {
        Self {
            upscale_factor: upscale_factor.max(1),
        }
    }

    /// Decode and binarize encoded image bytes.
    pub fn normalize(&self, bytes: &[u8]) -> Result<NormalizedImage, OcrError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| OcrError::ImageError(e.to_string()))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();

        let scaled = if self.upscale_factor > 1 {
            imageops::resize(
                &gray,
                width.saturating_mul(self.upscale_factor),
                height.saturating_mul(self.upscale_factor),
                FilterType::CatmullRom,
            )
        } else {
            gray
        };

        let threshold = otsu_threshold(&scaled);
        let image = binarize(&scaled, threshold);

        debug!(
            from = format!("{width}x{height}"),
            to = format!("{}x{}", image.width(), image.height()),
            threshold,
            "Normalized image"
        );

        Ok(NormalizedImage {
            image,
            original_width: width,
            original_height: height,
            threshold,
        })
    }
}

/// Otsu's global threshold: the level maximizing between-class variance.
///
/// Ties keep the lowest level. Uniform images yield 0.
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for p in img.pixels() {
        histogram[p.0[0] as usize] += 1;
    }

    let total = img.width() as f64 * img.height() as f64;
    if total == 0.0 {
        return 0;
    }

    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0.0;
    let mut background_sum = 0.0;
    let mut best_variance = 0.0;
    let mut best_level = 0u8;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight;
        let diff = background_mean - foreground_mean;
        let variance = background_weight * foreground_weight * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Pixels strictly above `threshold` become white, the rest black.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        *p = if p.0[0] > threshold { Luma([255]) } else { Luma([0]) };
    }
    out
}
