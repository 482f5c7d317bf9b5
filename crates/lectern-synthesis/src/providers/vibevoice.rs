//! VibeVoice adapter.
//!
//! Targets a self-hosted VibeVoice inference server. Synchronous, no
//! timestamp support; behaves like the OpenAI path but with the
//! server's own request shape and optional auth.

use super::{error_body, SyncAudio};
use crate::config::VibeVoiceConfig;
use crate::error::ProviderError;
use lectern_types::{TextChunk, VoiceSpec};
use serde::Serialize;

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f32,
}

/// Thin client for a VibeVoice inference server.
#[derive(Debug, Clone)]
pub struct VibeVoiceClient {
    config: VibeVoiceConfig,
    http: reqwest::Client,
}

impl VibeVoiceClient {
    pub fn new(config: VibeVoiceConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Synthesizes one chunk, returning encoded audio bytes.
    pub async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<SyncAudio, ProviderError> {
        if self.config.endpoint.is_empty() {
            return Err(ProviderError::Configuration(
                "VibeVoice endpoint is not configured".to_string(),
            ));
        }

        let url = format!("{}/tts", self.config.endpoint);
        let body = TtsRequest {
            text: &chunk.text,
            voice: &voice.voice_id,
            speed: voice.speaking_rate,
        };

        tracing::debug!(chunk = chunk.index, chars = chunk.text.len(), "vibevoice dispatch");

        let mut request = self.http.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(self.config.api_key.as_str());
        }
        let resp = request.send().await?;

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
                "VibeVoice returned an empty audio body".to_string(),
            ));
        }

        Ok(SyncAudio {
            bytes,
            marks: Vec::new(),
            reported_duration_sec: None,
        })
    }
}
