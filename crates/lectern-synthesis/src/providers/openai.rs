//! OpenAI speech adapter.
//!
//! Synchronous: the response body is the encoded audio. No timestamp
//! support, so highlighting is unavailable for audio produced here.

use super::{error_body, SyncAudio};
use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use lectern_types::{TextChunk, VoiceSpec};
use serde::Serialize;

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

/// Thin client for the OpenAI speech endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Synthesizes one chunk, returning MP3 bytes.
    pub async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<SyncAudio, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/audio/speech", self.config.endpoint);
        let body = SpeechRequest {
            model: &self.config.model,
            input: &chunk.text,
            voice: &voice.voice_id,
            speed: voice.speaking_rate,
            response_format: "mp3",
        };

        tracing::debug!(chunk = chunk.index, chars = chunk.text.len(), "openai dispatch");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                error_body(resp).await,
            ));
        }

        let bytes = resp.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(ProviderError::Transient(
                "OpenAI returned an empty audio body".to_string(),
            ));
        }

        Ok(SyncAudio {
            bytes,
            marks: Vec::new(),
            reported_duration_sec: None,
        })
    }
}
