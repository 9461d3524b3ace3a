//! docintake - document ingestion and extraction-confidence scoring.
//!
//! Turns images, PDFs, plain text, zip archives, web pages and video
//! transcripts into one uniform, confidence-scored text record.
//!
//! ```no_run
//! # async fn run() -> Result<(), docintake::IngestError> {
//! use docintake::{Config, Ingestor, Reference};
//!
//! let ingestor = Ingestor::new(Config::default())?;
//! let output = ingestor.ingest(&Reference::parse("scan.png")).await?;
//! for result in output.results() {
//!     println!("{} {}", result.confidence(), result.meta().recommended_llm_mode.as_str());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod extractors;
pub mod http_client;
pub mod models;
pub mod ocr;
pub mod quality;
pub mod tools;

pub use config::Config;
pub use dispatch::{Ingestor, Reference, SourceKind};
pub use error::{ArchiveError, IngestError, TranscriptError};
pub use models::{
    BatchEntry, BatchError, FileMeta, IngestMeta, IngestOutput, IngestionResult, InputType,
    LlmMode, NoiseLevel, SourceMeta, TextDensity, Warning, Warnings,
};
