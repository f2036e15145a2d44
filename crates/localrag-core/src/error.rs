use std::time::Duration;

use thiserror::Error;

/// Coarse classification used by callers that only care which collaborator
/// failed (the CLI prints it, the orchestrator logs it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conversion,
    Embedding,
    Index,
    Generation,
    Configuration,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Conversion failed for {source_name}: {reason}")]
    Conversion { source_name: String, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index operation failed: {0}")]
    Index(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Non-terminating split: split_overlap ({split_overlap}) must be smaller than split_length ({split_length}) and both must be positive")]
    NonTerminatingSplit { split_length: usize, split_overlap: usize },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    pub fn conversion(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Conversion { source_name: source_name.into(), reason: reason.to_string() }
    }

    pub fn index(err: impl ToString) -> Self { Self::Index(err.to_string()) }

    pub fn embedding(err: impl ToString) -> Self { Self::Embedding(err.to_string()) }

    pub fn generation(err: impl ToString) -> Self { Self::Generation(err.to_string()) }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::Embedding(_) | Self::DimensionMismatch { .. } => ErrorKind::Embedding,
            Self::Index(_) | Self::NotFound(_) => ErrorKind::Index,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Configuration(_) | Self::NonTerminatingSplit { .. } => ErrorKind::Configuration,
            Self::Cancelled | Self::Timeout(_) => ErrorKind::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
