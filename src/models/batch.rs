//! Archive batch results.

use serde::{Deserialize, Serialize};

use super::result::IngestionResult;

/// A member that could not be ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub origin: String,
    pub error: String,
}

/// One entry of an archive batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Failed(BatchError),
    Ingested(Box<IngestionResult>),
}

impl BatchEntry {
    pub fn failed(origin: impl Into<String>, error: impl ToString) -> Self {
        Self::Failed(BatchError {
            origin: origin.into(),
            error: error.to_string(),
        })
    }

    pub fn as_result(&self) -> Option<&IngestionResult> {
        match self {
            Self::Ingested(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&BatchError> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Ingested(_) => None,
        }
    }
}

/// What a single `ingest` call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngestOutput {
    Batch(Vec<BatchEntry>),
    Single(Box<IngestionResult>),
}

impl IngestOutput {
    pub fn single(result: IngestionResult) -> Self {
        Self::Single(Box::new(result))
    }

    pub fn as_single(&self) -> Option<&IngestionResult> {
        match self {
            Self::Single(result) => Some(result),
            Self::Batch(_) => None,
        }
    }

    pub fn as_batch(&self) -> Option<&[BatchEntry]> {
        match self {
            Self::Batch(entries) => Some(entries),
            Self::Single(_) => None,
        }
    }

    /// Every successful result, whether single or batched.
    pub fn results(&self) -> Vec<&IngestionResult> {
        match self {
            Self::Single(result) => vec![result.as_ref()],
            Self::Batch(entries) => entries.iter().filter_map(BatchEntry::as_result).collect(),
        }
    }
}
