//! OCR support for image and PDF extraction.
//!
//! - [`ImageNormalizer`]: grayscale, cubic upscale and Otsu binarization
//! - [`OcrBackend`]: image file to text ([`TesseractBackend`] by default)
//! - [`PageRasterizer`]: PDF pages to image files ([`PdftoppmRasterizer`] by default)

mod backend;
mod normalize;
mod rasterize;
mod tesseract;

pub use backend::{OcrBackend, OcrConfig, OcrError, OcrResult};
pub use normalize::{binarize, otsu_threshold, ImageNormalizer, NormalizedImage};
pub use rasterize::{find_page_images, PageRasterizer, PdftoppmRasterizer};
pub use tesseract::TesseractBackend;
