//! Amazon Polly adapter.
//!
//! Two modes. The sync path wraps the chunk in an SSML prosody envelope
//! and returns audio inline; it is used for short-lived audio that is
//! never persisted. The persisted path starts two parallel synthesis
//! tasks per chunk — one producing audio, one producing speech-mark
//! events — and returns both handles for the poller to drive; both must
//! complete before assembly.
//!
//! The marks task is given the plain chunk text (no SSML), so the
//! returned character offsets index the chunk directly; mark times are
//! rescaled by the speaking rate to line up with the prosody-adjusted
//! audio. The endpoint is a Polly-compatible REST gateway; request
//! signing happens upstream of this core.

use super::{error_body, ChunkOutcome, JobHandle, JobKind, JobPair, SyncAudio};
use crate::config::AmazonConfig;
use crate::error::ProviderError;
use crate::poller::{JobState, JobStatusSource};
use lectern_types::{MarkKind, RawMark, TextChunk, VoiceSpec};
use serde::{Deserialize, Serialize};

/// Escapes the characters XML cannot carry in text content.
fn ssml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps escaped chunk text in a prosody envelope carrying the
/// speaking rate as a percentage.
fn wrap_prosody(text: &str, speaking_rate: f32) -> String {
    let rate = (speaking_rate * 100.0).round() as i32;
    format!(
        "<speak><prosody rate=\"{rate}%\">{}</prosody></speak>",
        ssml_escape(text)
    )
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SpeechRequest<'a> {
    text: &'a str,
    text_type: &'a str,
    voice_id: &'a str,
    output_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_mark_types: Option<&'a [&'a str]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesisTaskResponse {
    synthesis_task: SynthesisTask,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesisTask {
    task_id: String,
    task_status: String,
    #[serde(default)]
    output_uri: Option<String>,
    #[serde(default)]
    task_status_reason: Option<String>,
}

/// One line of Polly's speech-mark output (newline-delimited JSON).
#[derive(Deserialize)]
struct PollyMarkEvent {
    /// Milliseconds from the start of the (normal-rate) audio.
    time: u64,
    #[serde(rename = "type")]
    kind: String,
    /// Byte offset into the input text (inclusive).
    start: usize,
    /// Byte offset into the input text (exclusive).
    end: usize,
    #[serde(default)]
    value: String,
}

/// Parses Polly's speech-mark NDJSON into chunk-local raw marks.
///
/// `speaking_rate` rescales event times: the marks task synthesizes at
/// normal rate while the audio task carries the prosody envelope, so an
/// event at `t` ms lands at `t / rate` in the audible stream. Mark text
/// is sliced from the chunk by the reported offsets; event types other
/// than word/sentence (ssml, viseme) are skipped.
pub fn parse_marks_ndjson(
    bytes: &[u8],
    speaking_rate: f32,
    chunk_text: &str,
) -> Result<Vec<RawMark>, ProviderError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProviderError::Transient(format!("non-UTF-8 speech mark output: {e}")))?;
    let rate = f64::from(speaking_rate).max(f64::MIN_POSITIVE);

    let mut marks = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: PollyMarkEvent = serde_json::from_str(line)
            .map_err(|e| ProviderError::Transient(format!("malformed speech mark line: {e}")))?;
        let kind = match event.kind.as_str() {
            "word" => MarkKind::Word,
            "sentence" => MarkKind::Sentence,
            _ => continue,
        };
        let value = chunk_text
            .get(event.start..event.end)
            .map(str::to_string)
            .unwrap_or(event.value);
        let start_sec = (event.time as f64 / 1000.0) / rate;
        marks.push(RawMark {
            kind,
            start_sec,
            end_sec: start_sec,
            text: value,
            char_start: Some(event.start),
        });
    }
    Ok(marks)
}

/// Thin client for a Polly-compatible REST endpoint.
#[derive(Debug, Clone)]
pub struct PollyClient {
    config: AmazonConfig,
    http: reqwest::Client,
    /// Persisted requests take the job-based path with speech marks.
    persist: bool,
}

impl PollyClient {
    pub fn new(config: AmazonConfig, http: reqwest::Client, persist: bool) -> Self {
        Self {
            config,
            http,
            persist,
        }
    }

    fn check_credentials(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "Amazon Polly credentials are not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Dispatches one chunk: inline audio for the sync path, a job
    /// pair (audio + marks tasks) for the persisted path.
    pub async fn dispatch(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<ChunkOutcome, ProviderError> {
        self.check_credentials()?;
        if self.persist {
            self.start_task_pair(chunk, voice).await.map(ChunkOutcome::Jobs)
        } else {
            self.synthesize_inline(chunk, voice)
                .await
                .map(ChunkOutcome::Audio)
        }
    }

    async fn synthesize_inline(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<SyncAudio, ProviderError> {
        let ssml = wrap_prosody(&chunk.text, voice.speaking_rate);
        let body = SpeechRequest {
            text: &ssml,
            text_type: "ssml",
            voice_id: &voice.voice_id,
            output_format: "mp3",
            speech_mark_types: None,
        };

        tracing::debug!(chunk = chunk.index, chars = chunk.text.len(), "polly inline dispatch");

        let url = format!("{}/v1/speech", self.config.endpoint);
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
                "Polly returned an empty audio body".to_string(),
            ));
        }

        Ok(SyncAudio {
            bytes,
            marks: Vec::new(),
            reported_duration_sec: None,
        })
    }

    async fn start_task_pair(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<JobPair, ProviderError> {
        let ssml = wrap_prosody(&chunk.text, voice.speaking_rate);
        let audio_request = SpeechRequest {
            text: &ssml,
            text_type: "ssml",
            voice_id: &voice.voice_id,
            output_format: "mp3",
            speech_mark_types: None,
        };
        // Plain text keeps the reported offsets chunk-local; times are
        // rescaled at parse time instead.
        let marks_request = SpeechRequest {
            text: &chunk.text,
            text_type: "text",
            voice_id: &voice.voice_id,
            output_format: "json",
            speech_mark_types: Some(&["word", "sentence"]),
        };

        tracing::debug!(chunk = chunk.index, chars = chunk.text.len(), "polly task dispatch");

        let audio_task = self.start_task(&audio_request).await?;
        let marks_task = self.start_task(&marks_request).await?;

        Ok(JobPair {
            audio: JobHandle {
                id: audio_task,
                kind: JobKind::Audio,
            },
            marks: Some(JobHandle {
                id: marks_task,
                kind: JobKind::Marks,
            }),
        })
    }

    async fn start_task(&self, body: &SpeechRequest<'_>) -> Result<String, ProviderError> {
        let url = format!("{}/v1/synthesisTasks", self.config.endpoint);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.as_str())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                error_body(resp).await,
            ));
        }

        let parsed: SynthesisTaskResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("malformed task response: {e}")))?;
        Ok(parsed.synthesis_task.task_id)
    }

    /// Downloads a completed task's output from its bucket URI.
    pub async fn fetch_output(&self, uri: &str) -> Result<Vec<u8>, ProviderError> {
        let resp = self.http.get(uri).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                error_body(resp).await,
            ));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

impl JobStatusSource for PollyClient {
    async fn job_status(&self, handle: &JobHandle) -> Result<JobState, ProviderError> {
        let url = format!("{}/v1/synthesisTasks/{}", self.config.endpoint, handle.id);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.config.api_key.as_str())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                error_body(resp).await,
            ));
        }

        let parsed: SynthesisTaskResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("malformed task response: {e}")))?;
        let task = parsed.synthesis_task;

        match task.task_status.as_str() {
            "scheduled" | "inProgress" => Ok(JobState::Pending),
            "completed" => match task.output_uri {
                Some(output_uri) => Ok(JobState::Completed { output_uri }),
                None => Ok(JobState::Failed {
                    reason: "completed task carried no output location".to_string(),
                }),
            },
            "failed" => Ok(JobState::Failed {
                reason: task
                    .task_status_reason
                    .unwrap_or_else(|| "task failed without a reason".to_string()),
            }),
            other => Err(ProviderError::Transient(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}
