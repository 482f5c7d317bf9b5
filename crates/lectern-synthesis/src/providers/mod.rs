//! Provider adapters.
//!
//! Each adapter is a thin HTTP client that turns one text chunk plus a
//! voice selection into either immediate audio bytes (sync providers)
//! or a pair of provider-side job handles (Polly's persisted path).
//! Dispatch goes through the `ProviderClient` enum so the provider is
//! resolved exactly once, at the request boundary, against the
//! capability table in `lectern_types::Provider::caps()`.

pub mod lemonfox;
pub mod openai;
pub mod polly;
pub mod vibevoice;

use crate::config::SynthesisConfig;
use crate::error::ProviderError;
use lectern_types::{Provider, RawMark, TextChunk, VoiceSpec};
use std::time::Duration;

pub use lemonfox::LemonfoxClient;
pub use openai::OpenAiClient;
pub use polly::PollyClient;
pub use vibevoice::VibeVoiceClient;

/// A synchronous synthesis result: audio in hand, marks if the
/// provider produced any.
#[derive(Debug, Clone)]
pub struct SyncAudio {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// Chunk-local timestamp events; empty for providers without
    /// timestamp support.
    pub marks: Vec<RawMark>,
    /// Segment duration when the provider reports (or implies) one.
    pub reported_duration_sec: Option<f64>,
}

/// What a provider-side job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Audio,
    Marks,
}

/// Handle to one provider-side synthesis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Provider-assigned task identifier.
    pub id: String,
    pub kind: JobKind,
}

/// The job handles produced by one async chunk dispatch. Polly's
/// persisted path starts two parallel tasks, one for audio and one for
/// speech marks; both must complete before assembly proceeds.
#[derive(Debug, Clone)]
pub struct JobPair {
    pub audio: JobHandle,
    pub marks: Option<JobHandle>,
}

/// Outcome of dispatching one chunk to a provider.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// The reply contained the audio itself.
    Audio(SyncAudio),
    /// The reply was a job (pair) that must be polled.
    Jobs(JobPair),
}

/// Builds the shared outbound HTTP client for provider calls.
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Lectern/0.1 (speech-synthesis)")
        .build()
        .unwrap_or_default()
}

/// Reads an error body for diagnostics, trimmed to a sane length.
pub(crate) async fn error_body(resp: reqwest::Response) -> String {
    const MAX_ERROR_BODY: usize = 512;
    match resp.text().await {
        Ok(mut body) => {
            body.truncate(MAX_ERROR_BODY);
            body
        }
        Err(_) => String::new(),
    }
}

/// One provider adapter, resolved once per synthesis request.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    OpenAi(OpenAiClient),
    Amazon(PollyClient),
    Lemonfox(LemonfoxClient),
    VibeVoice(VibeVoiceClient),
}

impl ProviderClient {
    /// Resolves the adapter for `provider`. `persist` selects Polly's
    /// job-based path (audio + speech marks stored durably) over its
    /// inline sync path.
    pub fn for_provider(config: &SynthesisConfig, provider: Provider, persist: bool) -> Self {
        let http = build_http_client(config.http.request_timeout());
        match provider {
            Provider::OpenAi => {
                ProviderClient::OpenAi(OpenAiClient::new(config.openai.clone(), http))
            }
            Provider::Amazon => {
                ProviderClient::Amazon(PollyClient::new(config.amazon.clone(), http, persist))
            }
            Provider::Lemonfox => {
                ProviderClient::Lemonfox(LemonfoxClient::new(config.lemonfox.clone(), http))
            }
            Provider::VibeVoice => {
                ProviderClient::VibeVoice(VibeVoiceClient::new(config.vibevoice.clone(), http))
            }
        }
    }

    /// Dispatches one chunk. Sync providers answer with audio bytes;
    /// Polly's persisted path answers with job handles.
    pub async fn dispatch(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<ChunkOutcome, ProviderError> {
        let caps = voice.provider.caps();
        if chunk.text.chars().count() > caps.max_chunk_chars {
            return Err(ProviderError::Configuration(format!(
                "chunk {} exceeds {} character limit for {}",
                chunk.index, caps.max_chunk_chars, voice.provider
            )));
        }

        match self {
            ProviderClient::OpenAi(client) => {
                Ok(ChunkOutcome::Audio(client.synthesize(chunk, voice).await?))
            }
            ProviderClient::Amazon(client) => client.dispatch(chunk, voice).await,
            ProviderClient::Lemonfox(client) => {
                Ok(ChunkOutcome::Audio(client.synthesize(chunk, voice).await?))
            }
            ProviderClient::VibeVoice(client) => {
                Ok(ChunkOutcome::Audio(client.synthesize(chunk, voice).await?))
            }
        }
    }
}
