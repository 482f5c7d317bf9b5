//! Speech synthesis orchestration and alignment engine for Lectern.
//!
//! Turns arbitrary-length document text into one continuous audio
//! stream plus word/sentence-level speech marks for read-along
//! highlighting, across four heterogeneous TTS providers. The pipeline:
//!
//! 1. chunk the document at sentence/word boundaries within the
//!    provider's size limit (`chunker`),
//! 2. fan out one dispatch per chunk (`providers`, `orchestrator`),
//!    polling provider-side jobs where the provider works that way
//!    (`poller`),
//! 3. concatenate chunk audio into one stream (`assemble`),
//! 4. rebase chunk-local timestamps onto the global timeline and text
//!    (`align`),
//! 5. resolve playback positions back to marks (`playback`).
//!
//! Storage, extraction, and the web surface are external collaborators;
//! see the `lectern-store` crate for the persistence seams.

pub mod align;
pub mod assemble;
pub mod chunker;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod playback;
pub mod poller;
pub mod providers;

pub use align::align;
pub use assemble::{assemble, estimate_duration_sec, AssembledAudio};
pub use chunker::split_text;
pub use config::{load_config, SynthesisConfig};
pub use error::{AlignmentError, AssemblyError, ConfigError, ProviderError, SynthesisError};
pub use orchestrator::{Highlighting, Orchestrator, SynthesisBackend, SynthesisOutput};
pub use playback::current_mark;
pub use poller::{cancellation, CancelHandle, CancelToken, JobState, JobStatusSource};
pub use providers::ProviderClient;

use lectern_types::VoiceSpec;

/// Synthesizes one document with the configured provider stack.
///
/// `persist` selects the durable path (Polly runs job-based with
/// speech marks; results are meant for blob storage) over the inline
/// path used for short-lived audio.
pub async fn synthesize_document(
    config: &SynthesisConfig,
    text: &str,
    voice: &VoiceSpec,
    persist: bool,
) -> Result<SynthesisOutput, SynthesisError> {
    let client = ProviderClient::for_provider(config, voice.provider, persist);
    let orchestrator = Orchestrator::new(client, config.polling.clone(), config.audio.clone());
    orchestrator.synthesize(text, voice).await
}

/// Like [`synthesize_document`], but loads configuration from
/// `config_path` first. A missing file falls back to defaults; an
/// unreadable or unparseable one fails the request before any chunk is
/// dispatched.
pub async fn synthesize_document_from_path(
    config_path: Option<&str>,
    text: &str,
    voice: &VoiceSpec,
    persist: bool,
) -> Result<SynthesisOutput, SynthesisError> {
    let config = load_config(config_path)?;
    synthesize_document(&config, text, voice, persist).await
}
