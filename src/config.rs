//! Configuration for the ingestion pipeline.
//!
//! Loaded from an explicit path, or discovered by `prefer` under the name
//! `docintake`; environment overrides apply last.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// OCR and rasterization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language code.
    pub language: String,
    /// Resolution for PDF page rasterization.
    pub dpi: u32,
    /// Upscale factor applied before binarization.
    pub upscale_factor: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 300,
            upscale_factor: 2,
        }
    }
}

/// Web page fetching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    pub timeout_secs: u64,
    /// None for the crate's own agent, "impersonate" for a browser agent,
    /// anything else is sent verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: Some("impersonate".to_string()),
        }
    }
}

impl WebSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Video transcript settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// yt-dlp binary name or path (`~` is expanded).
    pub yt_dlp: String,
    /// Upper bound for one yt-dlp metadata call.
    pub yt_dlp_timeout_secs: u64,
    /// Timeout for downloading a caption track.
    pub timeout_secs: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            yt_dlp_timeout_secs: 30,
            timeout_secs: 10,
        }
    }
}

impl YoutubeSettings {
    pub fn yt_dlp_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.yt_dlp).as_ref())
    }

    pub fn yt_dlp_timeout(&self) -> Duration {
        Duration::from_secs(self.yt_dlp_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Archive expansion limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Maximum nesting of archives inside archives.
    pub max_depth: usize,
    pub max_entries: usize,
    /// Upper bound on the declared uncompressed size of all entries.
    pub max_total_bytes: u64,
    /// Members processed concurrently.
    pub workers: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_entries: 10_000,
            max_total_bytes: 1024 * 1024 * 1024,
            workers: 4,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrSettings,
    pub web: WebSettings,
    pub youtube: YoutubeSettings,
    pub archive: ArchiveSettings,
    /// Attach file metadata to results produced from files.
    pub attach_file_meta: bool,
    /// Where this config was loaded from, if anywhere.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrSettings::default(),
            web: WebSettings::default(),
            youtube: YoutubeSettings::default(),
            archive: ArchiveSettings::default(),
            attach_file_meta: true,
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults (with env overrides) when nothing is found.
    pub async fn load() -> Self {
        match prefer::load("docintake").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config at {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default_with_env()
            }
        }
    }

    /// Defaults with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// TOML, YAML or JSON is chosen by file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded config");
        Ok(config.with_env_overrides())
    }

    /// Apply `DOCINTAKE_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // DOCINTAKE_OCR_LANGUAGE - tesseract language
        if let Some(language) = lookup("DOCINTAKE_OCR_LANGUAGE").filter(|v| !v.is_empty()) {
            self.ocr.language = language;
        }

        // DOCINTAKE_WEB_TIMEOUT - seconds
        if let Some(raw) = lookup("DOCINTAKE_WEB_TIMEOUT") {
            match raw.parse() {
                Ok(secs) => self.web.timeout_secs = secs,
                Err(_) => warn!("Invalid DOCINTAKE_WEB_TIMEOUT: {}", raw),
            }
        }

        // DOCINTAKE_YT_DLP - yt-dlp binary
        if let Some(path) = lookup("DOCINTAKE_YT_DLP").filter(|v| !v.is_empty()) {
            self.youtube.yt_dlp = path;
        }

        // DOCINTAKE_ARCHIVE_MAX_DEPTH - nested archive limit
        if let Some(raw) = lookup("DOCINTAKE_ARCHIVE_MAX_DEPTH") {
            match raw.parse() {
                Ok(depth) => self.archive.max_depth = depth,
                Err(_) => warn!("Invalid DOCINTAKE_ARCHIVE_MAX_DEPTH: {}", raw),
            }
        }

        self
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.ocr.upscale_factor, 2);
        assert_eq!(config.web.timeout(), Duration::from_secs(10));
        assert_eq!(config.archive.max_depth, 3);
        assert!(config.attach_file_meta);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DOCINTAKE_OCR_LANGUAGE", "deu"),
            ("DOCINTAKE_WEB_TIMEOUT", "3"),
            ("DOCINTAKE_YT_DLP", "/opt/yt-dlp"),
            ("DOCINTAKE_ARCHIVE_MAX_DEPTH", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.web.timeout_secs, 3);
        assert_eq!(config.youtube.yt_dlp, "/opt/yt-dlp");
        assert_eq!(config.archive.max_depth, 3);
    }

    #[tokio::test]
    async fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docintake.toml");
        std::fs::write(&path, "attach_file_meta = false\n[archive]\nworkers = 8\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert!(!config.attach_file_meta);
        assert_eq!(config.archive.workers, 8);
        assert_eq!(config.archive.max_entries, 10_000);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("docintake.yaml");
        std::fs::write(&yaml, "ocr:\n  language: fra\n").unwrap();
        assert_eq!(Config::load_from_path(&yaml).await.unwrap().ocr.language, "fra");

        let json = dir.path().join("docintake.json");
        std::fs::write(&json, r#"{"youtube": {"timeout_secs": 5}}"#).unwrap();
        assert_eq!(Config::load_from_path(&json).await.unwrap().youtube.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_invalid_file_reports_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[ocr\n").unwrap();
        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.contains("TOML"));
    }

    #[test]
    fn test_toml_round_trip() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_tilde_expanded() {
        let settings = YoutubeSettings {
            yt_dlp: "~/bin/yt-dlp".to_string(),
            ..Default::default()
        };
        assert!(!settings.yt_dlp_path().to_string_lossy().starts_with('~'));
    }
}
