//! Error types for the synthesis engine.

use thiserror::Error;

/// Errors surfaced by a provider adapter for a single chunk dispatch.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Missing or invalid credentials/endpoint. Fatal, never retried.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    /// The provider rejected the request (4xx). Fatal for this chunk;
    /// sibling chunks are unaffected until the join step.
    #[error("provider rejected request (status {status}): {message}")]
    ProviderRejected { status: u16, message: String },

    /// 5xx or network timeout. Retry-eligible for polled jobs,
    /// surfaced immediately for synchronous calls.
    #[error("transient provider error: {0}")]
    Transient(String),
}

impl ProviderError {
    /// Classifies a non-success HTTP status per the adapter taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            ProviderError::ProviderRejected { status, message }
        } else {
            ProviderError::Transient(format!("status {status}: {message}"))
        }
    }

    /// True for errors the poller may retry on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // Connection failures and timeouts are transient; anything the
        // server answered is classified from its status code.
        match e.status() {
            Some(status) => ProviderError::from_status(status.as_u16(), e.to_string()),
            None => ProviderError::Transient(e.to_string()),
        }
    }
}

/// Aligned marks violated an invariant. Handled locally: playback
/// degrades to no-highlight mode, the audio itself stays valid.
#[derive(Debug, Clone, Error)]
pub enum AlignmentError {
    #[error("mark {index} is earlier than its predecessor ({time_ms}ms < {prev_ms}ms)")]
    NonMonotonic {
        index: usize,
        time_ms: u64,
        prev_ms: u64,
    },

    #[error("mark {index} references text range {char_start}..{char_end} outside document of {doc_len} bytes")]
    OutOfRange {
        index: usize,
        char_start: usize,
        char_end: usize,
        doc_len: usize,
    },
}

/// Segment concatenation failed. Fatal for the request.
#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    #[error("audio segment {index} is empty")]
    EmptySegment { index: usize },

    #[error("audio segments out of order at position {position} (index {found})")]
    OutOfOrder { position: usize, found: usize },
}

/// Top-level failure of one synthesis request.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("document text contains nothing to synthesize")]
    EmptyInput,

    #[error("chunk {chunk} dispatch failed: {source}")]
    ChunkDispatch {
        chunk: usize,
        #[source]
        source: ProviderError,
    },

    #[error("chunk {chunk} synthesis job did not complete within the polling deadline")]
    PollTimeout { chunk: usize },

    #[error("chunk {chunk} synthesis job failed: {reason}")]
    PollFailed { chunk: usize, reason: String },

    #[error("audio assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Errors loading the synthesis configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ProviderError::from_status(401, "bad key"),
            ProviderError::ProviderRejected { status: 401, .. }
        ));
        assert!(matches!(
            ProviderError::from_status(503, "overloaded"),
            ProviderError::Transient(_)
        ));
        assert!(ProviderError::from_status(500, "x").is_transient());
        assert!(!ProviderError::from_status(404, "x").is_transient());
    }
}
