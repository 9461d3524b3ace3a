//! Input routing and the top-level [`Ingestor`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::envelope;
use crate::error::IngestError;
use crate::extractors::{
    is_youtube_url, ArchiveExpander, ArchiveLimits, ImageExtractor, OfficeExtractor,
    PdfExtractor, TextPassthrough, TranscriptSource, VideoExtractor, WebExtractor,
    YtDlpTranscriptSource,
};
use crate::http_client::HttpClient;
use crate::models::{BatchEntry, IngestOutput, IngestionResult};
use crate::ocr::{
    ImageNormalizer, OcrBackend, OcrConfig, PageRasterizer, PdftoppmRasterizer, TesseractBackend,
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tiff"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json"];
const OFFICE_EXTENSIONS: &[&str] = &["docx", "pptx"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// Every kind of input the pipeline routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    Pdf,
    Text,
    Office,
    Archive,
    WebPage,
    Video,
}

impl SourceKind {
    /// Kind for a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if ext == "pdf" {
            Some(Self::Pdf)
        } else if TEXT_EXTENSIONS.contains(&ext) {
            Some(Self::Text)
        } else if OFFICE_EXTENSIONS.contains(&ext) {
            Some(Self::Office)
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            Some(Self::Archive)
        } else {
            None
        }
    }

    pub fn for_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .ok_or_else(|| {
                IngestError::UnsupportedKind(format!("{} (no extension)", path.display()))
            })?;
        Self::from_extension(&ext).ok_or(IngestError::UnsupportedKind(ext))
    }

    pub fn for_url(url: &str) -> Self {
        if is_youtube_url(url) {
            Self::Video
        } else {
            Self::WebPage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Office => "office",
            Self::Archive => "archive",
            Self::WebPage => "web_page",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Path(PathBuf),
    Url(String),
    /// In-memory upload. `name` supplies the extension; without one the kind
    /// is sniffed from the content.
    Bytes { name: String, data: Vec<u8> },
}

impl Reference {
    /// `http(s)://` strings are URLs, anything else is a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(input.to_string())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Human-readable label for logs and error records.
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Clone)]
struct Inner {
    config: Config,
    normalizer: ImageNormalizer,
    ocr: Arc<dyn OcrBackend>,
    rasterizer: Arc<dyn PageRasterizer>,
    transcripts: Arc<dyn TranscriptSource>,
    http: HttpClient,
    archive: ArchiveExpander,
    /// Bounds concurrent member extractions across every nesting level.
    member_slots: Arc<Semaphore>,
}

/// Top-level entry point: routes a [`Reference`] to its extractor.
///
/// Cheap to clone; clones share backends.
#[derive(Clone)]
pub struct Ingestor {
    inner: Arc<Inner>,
}

impl Ingestor {
    /// Build with the default backends (Tesseract, pdftoppm, yt-dlp).
    pub fn new(config: Config) -> Result<Self, IngestError> {
        let http = HttpClient::new(config.web.timeout(), config.web.user_agent.as_deref())?;
        let caption_client =
            HttpClient::new(config.youtube.timeout(), config.web.user_agent.as_deref())?;
        let transcripts = YtDlpTranscriptSource::new(
            config.youtube.yt_dlp_path(),
            config.youtube.yt_dlp_timeout(),
            caption_client,
        );
        let ocr = TesseractBackend::with_config(OcrConfig {
            language: config.ocr.language.clone(),
        });
        let archive = ArchiveExpander::new(ArchiveLimits {
            max_depth: config.archive.max_depth,
            max_entries: config.archive.max_entries,
            max_total_bytes: config.archive.max_total_bytes,
        });

        Ok(Self {
            inner: Arc::new(Inner {
                normalizer: ImageNormalizer::new(config.ocr.upscale_factor),
                ocr: Arc::new(ocr),
                rasterizer: Arc::new(PdftoppmRasterizer),
                transcripts: Arc::new(transcripts),
                http,
                archive,
                member_slots: Arc::new(Semaphore::new(config.archive.workers.max(1))),
                config,
            }),
        })
    }

    pub fn with_ocr_backend(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        Arc::make_mut(&mut self.inner).ocr = ocr;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Arc::make_mut(&mut self.inner).rasterizer = rasterizer;
        self
    }

    pub fn with_transcript_source(mut self, source: Arc<dyn TranscriptSource>) -> Self {
        Arc::make_mut(&mut self.inner).transcripts = source;
        self
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The OCR engine images and PDF pages are sent to.
    pub fn ocr_backend(&self) -> &dyn OcrBackend {
        self.inner.ocr.as_ref()
    }

    /// Ingest one reference.
    ///
    /// Archives produce a batch; everything else a single result. Network
    /// failures are reported as zero-confidence results, not errors.
    pub async fn ingest(&self, reference: &Reference) -> Result<IngestOutput, IngestError> {
        info!(reference = %reference, "Ingesting");
        match reference {
            Reference::Url(url) => Ok(IngestOutput::single(self.ingest_url(url).await)),
            Reference::Path(path) => {
                let origin = tokio::fs::canonicalize(path)
                    .await
                    .unwrap_or_else(|_| path.clone())
                    .display()
                    .to_string();
                self.dispatch_path(path, origin, 0).await
            }
            Reference::Bytes { name, data } => {
                // Scratch copy lives until dispatch finishes on every exit path.
                let scratch = TempDir::new()?;
                let file = scratch.path().join(upload_file_name(name, data)?);
                tokio::fs::write(&file, data).await?;
                self.dispatch_path(&file, name.clone(), 0).await
            }
        }
    }

    async fn ingest_url(&self, url: &str) -> IngestionResult {
        match SourceKind::for_url(url) {
            SourceKind::Video => {
                VideoExtractor::new(Arc::clone(&self.inner.transcripts))
                    .extract(url)
                    .await
            }
            _ => WebExtractor::new(self.inner.http.clone()).extract(url).await,
        }
    }

    fn dispatch_path<'a>(
        &'a self,
        path: &'a Path,
        origin: String,
        depth: usize,
    ) -> BoxFuture<'a, Result<IngestOutput, IngestError>> {
        Box::pin(async move {
            let kind = SourceKind::for_path(path)?;
            debug!(path = %path.display(), %kind, depth, "Dispatching");

            let inner = &self.inner;
            // Archives never hold a slot, so nested members cannot starve their parent.
            let _slot = if depth > 0 && kind != SourceKind::Archive {
                Some(
                    inner
                        .member_slots
                        .acquire()
                        .await
                        .map_err(|e| IngestError::ExtractionFailed(e.to_string()))?,
                )
            } else {
                None
            };

            let result = match kind {
                SourceKind::Image => {
                    ImageExtractor::new(inner.normalizer.clone(), Arc::clone(&inner.ocr))
                        .extract(path)
                        .await?
                }
                SourceKind::Pdf => {
                    PdfExtractor::new(
                        inner.normalizer.clone(),
                        Arc::clone(&inner.ocr),
                        Arc::clone(&inner.rasterizer),
                        inner.config.ocr.dpi,
                    )
                    .extract(path)
                    .await?
                }
                SourceKind::Text => TextPassthrough.extract(path).await?,
                SourceKind::Office => OfficeExtractor.extract(path).await?,
                SourceKind::Archive => return self.expand(path, &origin, depth).await,
                SourceKind::WebPage | SourceKind::Video => {
                    return Err(IngestError::UnsupportedKind(format!(
                        "{} is not a file kind",
                        kind
                    )))
                }
            };

            let result = if inner.config.attach_file_meta {
                result.with_file_meta(envelope::file_meta(path, origin).await?)
            } else {
                result
            };
            Ok(IngestOutput::single(result))
        })
    }

    /// Unpack an archive and dispatch every member, isolating failures.
    async fn expand(
        &self,
        path: &Path,
        origin: &str,
        depth: usize,
    ) -> Result<IngestOutput, IngestError> {
        let limits = self.inner.archive.limits();
        if depth > limits.max_depth {
            return Err(IngestError::DepthExceeded(limits.max_depth));
        }

        let scratch = TempDir::new()?;
        let expander = self.inner.archive.clone();
        let archive = path.to_path_buf();
        let dest = scratch.path().to_path_buf();
        let unpacked = tokio::task::spawn_blocking(move || expander.unpack(&archive, &dest)).await??;

        let mut entries: Vec<(String, BatchEntry)> = unpacked
            .failures
            .into_iter()
            .map(|(name, error)| {
                let member = member_origin(origin, &name);
                (member.clone(), BatchEntry::failed(member, error))
            })
            .collect();

        let workers = self.inner.config.archive.workers.max(1);
        let tasks: Vec<_> = unpacked
            .members
            .into_iter()
            .map(|member| {
                let member_origin = member_origin(origin, &member.name);
                async move {
                    let outcome = self
                        .dispatch_path(&member.path, member_origin.clone(), depth + 1)
                        .await;
                    (member_origin, outcome)
                }
            })
            .collect();
        let outcomes: Vec<(String, Result<IngestOutput, IngestError>)> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect()
            .await;

        for (member, outcome) in outcomes {
            match outcome {
                Ok(IngestOutput::Single(result)) => {
                    entries.push((member, BatchEntry::Ingested(result)));
                }
                Ok(IngestOutput::Batch(nested)) => {
                    for entry in nested {
                        let key = entry_origin(&entry).unwrap_or_else(|| member.clone());
                        entries.push((key, entry));
                    }
                }
                Err(e) => {
                    warn!(member = %member, "Archive member failed: {}", e);
                    entries.push((member.clone(), BatchEntry::failed(member, e)));
                }
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        info!(archive = %origin, entries = entries.len(), "Archive processed");
        Ok(IngestOutput::Batch(
            entries.into_iter().map(|(_, entry)| entry).collect(),
        ))
    }
}

fn member_origin(archive: &str, member: &str) -> String {
    format!("{}!/{}", archive, member)
}

fn entry_origin(entry: &BatchEntry) -> Option<String> {
    match entry {
        BatchEntry::Failed(error) => Some(error.origin.clone()),
        BatchEntry::Ingested(result) => result.file_meta().map(|m| m.origin.clone()),
    }
}

/// File name for an upload's scratch copy.
///
/// Keeps only the final path component; a missing extension is sniffed.
fn upload_file_name(name: &str, data: &[u8]) -> Result<String, IngestError> {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    if Path::new(&base).extension().is_some() {
        return Ok(base);
    }

    match infer::get(data) {
        Some(kind) => Ok(format!("{}.{}", base, kind.extension())),
        None => Err(IngestError::UnsupportedKind(format!(
            "{} (no extension, content not recognized)",
            name
        ))),
    }
}
