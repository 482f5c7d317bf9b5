//! Error types for the storage collaborators.

use lectern_types::AudioGenerationStatus;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by document and blob storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("no blob stored at {0}")]
    BlobNotFound(String),

    /// The requested status change is not a legal transition, e.g. a
    /// second generation request arriving while one is in flight.
    #[error("cannot move document from {from:?} to {to:?}")]
    InvalidTransition {
        from: AudioGenerationStatus,
        to: AudioGenerationStatus,
    },

    #[error("speech mark line {line} is not valid JSON: {source}")]
    MarkDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("speech mark encoding failed: {0}")]
    MarkEncode(#[from] serde_json::Error),
}
