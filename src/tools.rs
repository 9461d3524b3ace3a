//! External tool discovery.

use std::path::PathBuf;

/// Check if a binary is available in PATH (or at the given path).
pub fn check_binary(name: &str) -> bool {
    locate_binary(name).is_some()
}

/// Resolve a binary name or path to its location.
pub fn locate_binary(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// An external tool the pipeline shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub name: &'static str,
    pub binary: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl ExternalTool {
    pub fn location(&self) -> Option<PathBuf> {
        locate_binary(&self.binary)
    }
}

/// Tools used for PDF rasterization and transcripts.
///
/// The OCR engine reports its own availability through
/// [`crate::ocr::OcrBackend::is_available`].
pub fn required_tools(yt_dlp: &str) -> Vec<ExternalTool> {
    vec![
        ExternalTool {
            name: "pdftoppm",
            binary: "pdftoppm".to_string(),
            purpose: "PDF page rasterization",
            install_hint: "apt install poppler-utils",
        },
        ExternalTool {
            name: "yt-dlp",
            binary: yt_dlp.to_string(),
            purpose: "video transcript discovery",
            install_hint: "pip install yt-dlp",
        },
    ]
}
