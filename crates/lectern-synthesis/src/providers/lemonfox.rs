//! Lemonfox adapter.
//!
//! Synchronous. When word timestamps are requested the response is JSON
//! carrying base64 audio plus a `word_timestamps` array; the adapter
//! reconstructs chunk-local character offsets for each word, since
//! Lemonfox reports only times and the bare word strings.

use super::{error_body, SyncAudio};
use crate::config::LemonfoxConfig;
use crate::error::ProviderError;
use base64::Engine as _;
use lectern_types::{MarkKind, RawMark, TextChunk, VoiceSpec};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
    word_timestamps: bool,
}

#[derive(Deserialize)]
struct TimestampResponse {
    /// Base64-encoded audio.
    audio: String,
    #[serde(default)]
    word_timestamps: Vec<WordTimestamp>,
}

#[derive(Deserialize)]
struct WordTimestamp {
    word: String,
    /// Seconds relative to the chunk's audio.
    start: f64,
    /// Seconds relative to the chunk's audio.
    end: f64,
}

/// Punctuation tokens that attach to the preceding word without a
/// space when the chunk text is reconstructed from the word stream.
fn attaches_to_previous(word: &str) -> bool {
    matches!(word, "," | "." | "?" | "!")
}

/// Rebuilds chunk-local character offsets for a word stream by walking
/// a running cursor: one space between consecutive words, none before
/// attaching punctuation.
fn marks_from_words(words: &[WordTimestamp]) -> Vec<RawMark> {
    let mut cursor = 0usize;
    let mut marks = Vec::with_capacity(words.len());
    for w in words {
        if cursor > 0 && !attaches_to_previous(&w.word) {
            cursor += 1;
        }
        marks.push(RawMark {
            kind: MarkKind::Word,
            start_sec: w.start,
            end_sec: w.end,
            text: w.word.clone(),
            char_start: Some(cursor),
        });
        cursor += w.word.len();
    }
    marks
}

/// Thin client for the Lemonfox speech endpoint.
#[derive(Debug, Clone)]
pub struct LemonfoxClient {
    config: LemonfoxConfig,
    http: reqwest::Client,
}

impl LemonfoxClient {
    pub fn new(config: LemonfoxConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Synthesizes one chunk. With `word_timestamps` enabled the reply
    /// is JSON (base64 audio + timestamps); otherwise raw audio bytes.
    pub async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<SyncAudio, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "Lemonfox API key is not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/audio/speech", self.config.endpoint);
        let body = SpeechRequest {
            input: &chunk.text,
            voice: &voice.voice_id,
            speed: voice.speaking_rate,
            response_format: "mp3",
            word_timestamps: self.config.word_timestamps,
        };

        tracing::debug!(
            chunk = chunk.index,
            chars = chunk.text.len(),
            timestamps = self.config.word_timestamps,
            "lemonfox dispatch"
        );

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

        if !self.config.word_timestamps {
            let bytes = resp.bytes().await?.to_vec();
            return Ok(SyncAudio {
                bytes,
                marks: Vec::new(),
                reported_duration_sec: None,
            });
        }

        let parsed: TimestampResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("malformed Lemonfox response: {e}")))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&parsed.audio)
            .map_err(|e| ProviderError::Transient(format!("undecodable Lemonfox audio: {e}")))?;
        if bytes.is_empty() {
            return Err(ProviderError::Transient(
                "Lemonfox returned an empty audio body".to_string(),
            ));
        }

        let reported_duration_sec = parsed
            .word_timestamps
            .last()
            .map(|w| w.end)
            .filter(|&end| end > 0.0);
        let marks = marks_from_words(&parsed.word_timestamps);

        Ok(SyncAudio {
            bytes,
            marks,
            reported_duration_sec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(word: &str, start: f64, end: f64) -> WordTimestamp {
        WordTimestamp {
            word: word.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn offsets_accumulate_with_spaces() {
        // Reconstructed text: "Hello brave world"
        let words = vec![
            word("Hello", 0.0, 0.4),
            word("brave", 0.45, 0.8),
            word("world", 0.85, 1.2),
        ];
        let marks = marks_from_words(&words);
        assert_eq!(marks[0].char_start, Some(0));
        assert_eq!(marks[1].char_start, Some(6));
        assert_eq!(marks[2].char_start, Some(12));
    }

    #[test]
    fn punctuation_attaches_without_space() {
        // Reconstructed text: "Hello, world."
        let words = vec![
            word("Hello", 0.0, 0.4),
            word(",", 0.4, 0.45),
            word("world", 0.5, 0.9),
            word(".", 0.9, 0.95),
        ];
        let marks = marks_from_words(&words);
        assert_eq!(marks[0].char_start, Some(0));
        assert_eq!(marks[1].char_start, Some(5));
        assert_eq!(marks[2].char_start, Some(7));
        assert_eq!(marks[3].char_start, Some(12));
    }

    #[test]
    fn all_marks_are_word_kind() {
        let words = vec![word("a", 0.0, 0.1), word("b", 0.1, 0.2)];
        for mark in marks_from_words(&words) {
            assert_eq!(mark.kind, MarkKind::Word);
        }
    }

    #[test]
    fn empty_word_stream_yields_no_marks() {
        assert!(marks_from_words(&[]).is_empty());
    }
}
