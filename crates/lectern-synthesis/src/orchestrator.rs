//! Synthesis orchestration.
//!
//! The composition root of the engine: chunk the document, fan out one
//! dispatch task per chunk, drive any provider-side jobs to completion,
//! then join, assemble, and align. Chunk dispatches share no mutable
//! state; each task owns its chunk and reports into its own result
//! slot, so the join barrier is the only synchronization point.
//!
//! Partial failure policy: if any chunk fails, the whole request fails
//! and no audio is returned or persisted. A document that plays with a
//! silent or garbled gap is worse than one that retries from scratch.

use crate::align::align;
use crate::assemble::{assemble, estimate_duration_sec, AssembledAudio};
use crate::chunker::split_text;
use crate::config::{AudioConfig, PollingConfig};
use crate::error::{ProviderError, SynthesisError};
use crate::poller::{cancellation, poll_pair, CancelToken, JobStatusSource, PairResult};
use crate::providers::{polly, ChunkOutcome, JobHandle, ProviderClient};
use lectern_types::{AudioSegment, RawMark, SpeechMark, TextChunk, VoiceSpec};
use std::future::Future;
use std::sync::Arc;

/// Everything the orchestrator needs from a provider: chunk dispatch,
/// job status for polled paths, and output download for completed
/// jobs. `ProviderClient` is the production implementation; tests
/// substitute fakes to exercise the join semantics without a network.
pub trait SynthesisBackend: JobStatusSource + Send + Sync {
    fn dispatch(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> impl Future<Output = Result<ChunkOutcome, ProviderError>> + Send;

    fn fetch_output(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Whether aligned marks accompany the audio.
///
/// Callers must distinguish "no audio produced" (the request failed)
/// from "audio produced without timestamps" (playable, just not
/// highlightable); this flag carries the second case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlighting {
    Available,
    Unavailable,
}

/// Result of one successful synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// The assembled audio stream.
    pub audio: Vec<u8>,
    /// Total duration (provider-reported or estimated).
    pub duration_sec: f64,
    /// Document-global speech marks, sorted by time. Empty when the
    /// provider path produces no timestamps or alignment degraded.
    pub marks: Vec<SpeechMark>,
    pub highlighting: Highlighting,
}

/// One chunk's terminal dispatch result, slotted by index at the join.
struct ChunkPayload {
    index: usize,
    bytes: Vec<u8>,
    raw_marks: Vec<RawMark>,
    reported_duration_sec: Option<f64>,
}

/// Drives synthesis requests against one provider backend.
pub struct Orchestrator<B> {
    backend: Arc<B>,
    polling: PollingConfig,
    audio: AudioConfig,
}

impl<B: SynthesisBackend + 'static> Orchestrator<B> {
    pub fn new(backend: B, polling: PollingConfig, audio: AudioConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            polling,
            audio,
        }
    }

    /// Synthesizes `text` end to end. See `synthesize_cancellable`.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSpec,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let (_handle, token) = cancellation();
        self.synthesize_cancellable(text, voice, token).await
    }

    /// Synthesizes `text` end to end: chunk, fan out, join, assemble,
    /// align.
    ///
    /// `cancel` propagates into every chunk's job polling, so an
    /// abandoned request (reader navigated away) stops issuing provider
    /// status calls from whatever task triggers it.
    pub async fn synthesize_cancellable(
        &self,
        text: &str,
        voice: &VoiceSpec,
        cancel: CancelToken,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let caps = voice.provider.caps();
        let chunks = split_text(text, caps.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }

        tracing::info!(
            provider = %voice.provider,
            chunks = chunks.len(),
            chars = text.len(),
            "dispatching synthesis request"
        );

        // Fan-out: all chunks in parallel. Provider rate limits are
        // per-request, and chunks are independent.
        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let backend = Arc::clone(&self.backend);
            let chunk = chunk.clone();
            let voice = voice.clone();
            let polling = self.polling.clone();
            let token = cancel.clone();
            let index = chunk.index;
            handles.push((
                index,
                tokio::spawn(async move {
                    dispatch_chunk(backend, chunk, voice, polling, token).await
                }),
            ));
        }

        // Join barrier: wait for every chunk to reach a terminal state,
        // then fail on the lowest-indexed error, if any.
        let mut payloads = Vec::with_capacity(handles.len());
        let mut first_error: Option<SynthesisError> = None;
        for (index, handle) in handles {
            match handle.await {
                Ok(Ok(payload)) => payloads.push(payload),
                Ok(Err(e)) => {
                    tracing::warn!(chunk = index, error = %e, "chunk dispatch failed");
                    first_error.get_or_insert(e);
                }
                Err(join_error) => {
                    tracing::error!(chunk = index, error = %join_error, "chunk task join error");
                    first_error.get_or_insert(SynthesisError::ChunkDispatch {
                        chunk: index,
                        source: ProviderError::Transient(format!("task join error: {join_error}")),
                    });
                }
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        let assembled = self.assemble_payloads(&payloads)?;
        let raw_marks: Vec<Vec<RawMark>> = payloads.into_iter().map(|p| p.raw_marks).collect();

        // Alignment errors degrade to no-highlight mode: the audio is
        // still valid and playable.
        let (marks, highlighting) =
            match align(&chunks, &raw_marks, &assembled.cumulative_sec, text.len()) {
                Ok(marks) if !marks.is_empty() => (marks, Highlighting::Available),
                Ok(_) => (Vec::new(), Highlighting::Unavailable),
                Err(e) => {
                    tracing::warn!(error = %e, "alignment failed, disabling highlighting");
                    (Vec::new(), Highlighting::Unavailable)
                }
            };

        tracing::info!(
            bytes = assembled.bytes.len(),
            marks = marks.len(),
            duration_sec = assembled.total_sec,
            "synthesis request completed"
        );

        Ok(SynthesisOutput {
            audio: assembled.bytes,
            duration_sec: assembled.total_sec,
            marks,
            highlighting,
        })
    }

    fn assemble_payloads(
        &self,
        payloads: &[ChunkPayload],
    ) -> Result<AssembledAudio, SynthesisError> {
        let segments: Vec<AudioSegment> = payloads
            .iter()
            .map(|p| AudioSegment {
                index: p.index,
                bytes: p.bytes.clone(),
                duration_sec: p.reported_duration_sec.unwrap_or_else(|| {
                    estimate_duration_sec(p.bytes.len(), self.audio.estimated_bytes_per_sec)
                }),
            })
            .collect();
        Ok(assemble(&segments)?)
    }
}

/// Runs one chunk to a terminal state: dispatch, and for job-based
/// outcomes, poll both handles and download the outputs.
async fn dispatch_chunk<B: SynthesisBackend>(
    backend: Arc<B>,
    chunk: TextChunk,
    voice: VoiceSpec,
    polling: PollingConfig,
    cancel: CancelToken,
) -> Result<ChunkPayload, SynthesisError> {
    let index = chunk.index;
    let outcome = backend
        .dispatch(&chunk, &voice)
        .await
        .map_err(|source| SynthesisError::ChunkDispatch { chunk: index, source })?;

    match outcome {
        ChunkOutcome::Audio(sync) => Ok(ChunkPayload {
            index,
            bytes: sync.bytes,
            raw_marks: sync.marks,
            reported_duration_sec: sync.reported_duration_sec,
        }),
        ChunkOutcome::Jobs(pair) => {
            let result = poll_pair(
                backend.as_ref(),
                &pair,
                polling.interval(),
                polling.timeout(),
                cancel,
            )
            .await;
            let output = match result {
                PairResult::Completed(output) => output,
                PairResult::Failed { reason } => {
                    return Err(SynthesisError::PollFailed { chunk: index, reason })
                }
                PairResult::TimedOut => return Err(SynthesisError::PollTimeout { chunk: index }),
                PairResult::Cancelled => {
                    return Err(SynthesisError::PollFailed {
                        chunk: index,
                        reason: "request cancelled".to_string(),
                    })
                }
            };

            let bytes = backend
                .fetch_output(&output.audio_uri)
                .await
                .map_err(|source| SynthesisError::ChunkDispatch { chunk: index, source })?;

            let raw_marks = match &output.marks_uri {
                None => Vec::new(),
                Some(uri) => {
                    let mark_bytes = backend
                        .fetch_output(uri)
                        .await
                        .map_err(|source| SynthesisError::ChunkDispatch { chunk: index, source })?;
                    match polly::parse_marks_ndjson(&mark_bytes, voice.speaking_rate, &chunk.text) {
                        Ok(marks) => marks,
                        Err(e) => {
                            // Bad mark data costs highlighting, not audio.
                            tracing::warn!(chunk = index, error = %e, "discarding unparseable speech marks");
                            Vec::new()
                        }
                    }
                }
            };

            Ok(ChunkPayload {
                index,
                bytes,
                raw_marks,
                reported_duration_sec: None,
            })
        }
    }
}

impl JobStatusSource for ProviderClient {
    async fn job_status(&self, handle: &JobHandle) -> Result<crate::poller::JobState, ProviderError> {
        match self {
            ProviderClient::Amazon(client) => client.job_status(handle).await,
            _ => Err(ProviderError::Configuration(
                "provider has no job status API".to_string(),
            )),
        }
    }
}

impl SynthesisBackend for ProviderClient {
    async fn dispatch(
        &self,
        chunk: &TextChunk,
        voice: &VoiceSpec,
    ) -> Result<ChunkOutcome, ProviderError> {
        ProviderClient::dispatch(self, chunk, voice).await
    }

    async fn fetch_output(&self, uri: &str) -> Result<Vec<u8>, ProviderError> {
        match self {
            ProviderClient::Amazon(client) => client.fetch_output(uri).await,
            _ => Err(ProviderError::Configuration(
                "provider has no job output API".to_string(),
            )),
        }
    }
}
