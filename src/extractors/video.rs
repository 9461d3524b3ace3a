//! Video transcript extraction.
//!
//! Transcript discovery goes through [`TranscriptSource`]; the default
//! implementation asks `yt-dlp` for caption tracks and downloads the chosen
//! one over HTTP.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use super::web::collapse_whitespace;
use crate::envelope::Envelope;
use crate::error::TranscriptError;
use crate::http_client::HttpClient;
use crate::models::{IngestionResult, InputType, Warning, Warnings};
use crate::quality::WebContentAssessor;

const TRANSCRIPT_LANGUAGE: &str = "en";

/// One caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptTrack {
    /// BCP-47 style code, e.g. `en` or `en-GB`.
    pub language: String,
    /// Auto-generated rather than authored.
    pub generated: bool,
    /// Where the caption payload can be fetched.
    pub url: String,
    /// Payload format (`json3` or `vtt`).
    pub format: String,
}

impl TranscriptTrack {
    pub fn is_english(&self) -> bool {
        self.language == TRANSCRIPT_LANGUAGE || self.language.starts_with("en-")
    }
}

/// Lists and fetches caption tracks for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, TranscriptError>;

    /// Download a track and return its text segments in order.
    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<String>, TranscriptError>;
}

/// Check if a URL points at a YouTube host.
pub fn is_youtube_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|host| host.contains("youtube.com") || host.contains("youtu.be"))
}

/// Extract the video identifier from a YouTube URL.
///
/// Handles `watch?v=`, `youtu.be/<id>` and the `/embed/`, `/shorts/`, `/v/`
/// path forms.
pub fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    if host.contains("youtu.be") {
        return segments.next().map(str::to_string);
    }

    if host.contains("youtube.com") {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
            if !id.is_empty() {
                return Some(id.into_owned());
            }
        }
        if let (Some(kind), Some(id)) = (segments.next(), segments.next()) {
            if matches!(kind, "embed" | "shorts" | "v") {
                return Some(id.to_string());
            }
        }
    }

    None
}

/// Manually authored English first, then generated English.
/// Within each group an exact `en` beats regional variants.
pub fn select_english(tracks: &[TranscriptTrack]) -> Option<&TranscriptTrack> {
    let pick = |generated: bool| {
        let mut candidates = tracks
            .iter()
            .filter(move |t| t.generated == generated && t.is_english());
        let first = candidates.clone().next();
        candidates
            .find(|t| t.language == TRANSCRIPT_LANGUAGE)
            .or(first)
    };
    pick(false).or_else(|| pick(true))
}

/// Produces results for video links.
#[derive(Clone)]
pub struct VideoExtractor {
    source: Arc<dyn TranscriptSource>,
    assessor: WebContentAssessor,
}

impl VideoExtractor {
    pub fn new(source: Arc<dyn TranscriptSource>) -> Self {
        Self {
            source,
            assessor: WebContentAssessor::new(),
        }
    }

    pub async fn extract(&self, url: &str) -> IngestionResult {
        let envelope = Envelope::new(InputType::Youtube).source(url, TRANSCRIPT_LANGUAGE);

        let Some(id) = video_id(url) else {
            return envelope.empty(Warning::InvalidYoutubeUrl);
        };

        let tracks = match self.source.list_tracks(&id).await {
            Ok(tracks) => tracks,
            Err(e) => return envelope.empty(transcript_warning(e)),
        };

        let Some(track) = select_english(&tracks) else {
            info!(video = %id, tracks = tracks.len(), "No English transcript");
            return envelope.empty(Warning::NoEnglishTranscript);
        };
        debug!(video = %id, language = %track.language, generated = track.generated, "Selected transcript");

        let segments = match self.source.fetch(track).await {
            Ok(segments) => segments,
            Err(e) => return envelope.empty(transcript_warning(e)),
        };

        let text = collapse_whitespace(&segments.join(" "));
        let assessment = self.assessor.classify(&text, 1.0, Warnings::new());
        envelope.build(text, assessment)
    }
}

fn transcript_warning(err: TranscriptError) -> Warning {
    warn!("Transcript lookup failed: {}", err);
    match err {
        TranscriptError::Disabled => Warning::TranscriptsDisabled,
        TranscriptError::NotFound => Warning::NoTranscriptFound,
        TranscriptError::Other(detail) => Warning::YoutubeError(detail),
    }
}

/// Caption formats we can parse, most preferred first.
const PREFERRED_FORMATS: &[&str] = &["json3", "vtt"];

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    ext: String,
    url: String,
}

/// [`TranscriptSource`] backed by the `yt-dlp` binary.
pub struct YtDlpTranscriptSource {
    binary: PathBuf,
    timeout: Duration,
    client: HttpClient,
}

impl YtDlpTranscriptSource {
    pub fn new(binary: PathBuf, timeout: Duration, client: HttpClient) -> Self {
        Self {
            binary,
            timeout,
            client,
        }
    }

    async fn dump_json(&self, video_id: &str) -> Result<Value, TranscriptError> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--dump-json", "--no-playlist", "--skip-download"])
            .arg(&url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(TranscriptError::Other(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TranscriptError::Other(format!(
                    "{} not found",
                    self.binary.display()
                )))
            }
            Ok(Err(e)) => return Err(TranscriptError::Other(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("yt-dlp failed")
                .trim()
                .to_string();
            return Err(TranscriptError::Other(detail));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscriptError::Other(format!("Failed to parse yt-dlp JSON output: {}", e)))
    }
}

/// Turn yt-dlp's `subtitles` / `automatic_captions` maps into tracks.
///
/// Disabled when neither map offers anything.
pub(crate) fn tracks_from_metadata(metadata: &Value) -> Result<Vec<TranscriptTrack>, TranscriptError> {
    let mut tracks = Vec::new();
    let mut offered = 0;

    for (key, generated) in [("subtitles", false), ("automatic_captions", true)] {
        let Some(map) = metadata.get(key).and_then(Value::as_object) else {
            continue;
        };
        for (language, formats) in map {
            let formats: Vec<CaptionFormat> = formats
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|f| CaptionFormat::deserialize(f).ok())
                        .collect()
                })
                .unwrap_or_default();
            if formats.is_empty() {
                continue;
            }
            offered += 1;

            let chosen = PREFERRED_FORMATS
                .iter()
                .find_map(|ext| formats.iter().find(|f| f.ext == *ext));
            if let Some(format) = chosen {
                tracks.push(TranscriptTrack {
                    language: language.clone(),
                    generated,
                    url: format.url.clone(),
                    format: format.ext.clone(),
                });
            }
        }
    }

    if offered == 0 {
        return Err(TranscriptError::Disabled);
    }
    if tracks.is_empty() {
        return Err(TranscriptError::NotFound);
    }
    Ok(tracks)
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, TranscriptError> {
        let metadata = self.dump_json(video_id).await?;
        tracks_from_metadata(&metadata)
    }

    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<String>, TranscriptError> {
        let response = self
            .client
            .get(&track.url)
            .await
            .map_err(|e| TranscriptError::Other(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TranscriptError::Other(format!(
                "caption download returned {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptError::Other(e.to_string()))?;

        match track.format.as_str() {
            "json3" => parse_json3(&body),
            _ => Ok(parse_vtt(&body)),
        }
    }
}

/// Segments from YouTube's `json3` caption format.
pub(crate) fn parse_json3(body: &str) -> Result<Vec<String>, TranscriptError> {
    #[derive(Deserialize)]
    struct Json3 {
        #[serde(default)]
        events: Vec<Event>,
    }
    #[derive(Deserialize)]
    struct Event {
        #[serde(default)]
        segs: Vec<Seg>,
    }
    #[derive(Deserialize)]
    struct Seg {
        #[serde(default)]
        utf8: String,
    }

    let parsed: Json3 = serde_json::from_str(body)
        .map_err(|e| TranscriptError::Other(format!("Invalid json3 captions: {}", e)))?;

    Ok(parsed
        .events
        .into_iter()
        .map(|event| event.segs.into_iter().map(|s| s.utf8).collect::<String>())
        .filter(|line| !line.trim().is_empty())
        .collect())
}

/// `00:00:01.000 --> 00:00:04.000` plus optional cue settings.
static CUE_TIMING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}:)?\d{2}:\d{2}\.\d{3}\s+-->\s+").unwrap());

/// Inline voice, class and timestamp tags such as `<c>` or `<00:00:01.500>`.
static CUE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]*>").unwrap());

/// Cue text from WebVTT, without headers, timings or inline tags.
pub(crate) fn parse_vtt(body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut in_header = true;

    for line in body.lines() {
        let line = line.trim();
        if in_header {
            // Header block ends at the first blank line.
            if line.is_empty() {
                in_header = false;
            }
            continue;
        }
        if line.is_empty()
            || CUE_TIMING.is_match(line)
            || line.chars().all(|c| c.is_ascii_digit())
            || line.starts_with("NOTE")
        {
            continue;
        }

        let text = strip_tags(line);
        // Rolling auto-captions repeat the previous line.
        if !text.is_empty() && lines.last() != Some(&text) {
            lines.push(text);
        }
    }

    lines
}

fn strip_tags(line: &str) -> String {
    CUE_TAG.replace_all(line, "").trim().to_string()
}
