//! Data models for ingestion results.

mod batch;
mod result;
mod warning;

pub use batch::{BatchEntry, BatchError, IngestOutput};
pub use result::{
    FileMeta, IngestMeta, IngestionResult, InputType, LlmMode, NoiseLevel, SourceMeta,
    TextDensity, SCHEMA_VERSION,
};
pub use warning::{Warning, Warnings};
