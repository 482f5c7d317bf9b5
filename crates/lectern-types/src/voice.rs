//! Provider and voice definitions.
//!
//! A `VoiceSpec` selects a TTS provider, one of its voices, and a
//! speaking rate. Each provider declares a static capability table
//! (`ProviderCaps`) that the engine resolves once at the dispatch
//! boundary: chunk-size limit, timestamp support, and whether synthesis
//! runs as a provider-side job that must be polled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowest accepted speaking rate multiplier.
pub const MIN_SPEAKING_RATE: f32 = 0.25;

/// Highest accepted speaking rate multiplier.
pub const MAX_SPEAKING_RATE: f32 = 4.0;

/// Supported TTS providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI speech API (synchronous, no timestamps).
    OpenAi,
    /// Amazon Polly (synchronous for inline audio, job-based with
    /// speech marks when the result is persisted).
    Amazon,
    /// Lemonfox (synchronous, word-level timestamps on request).
    Lemonfox,
    /// VibeVoice (synchronous, no timestamps).
    VibeVoice,
}

/// Static capabilities of a provider, resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCaps {
    /// Maximum characters accepted in a single synthesis call.
    pub max_chunk_chars: usize,
    /// Whether the provider can return word/sentence timestamps.
    pub supports_timestamps: bool,
    /// Whether long-form synthesis runs as a provider-side job that
    /// must be polled for completion.
    pub is_async: bool,
}

impl Provider {
    /// Returns the capability table for this provider.
    pub fn caps(self) -> ProviderCaps {
        match self {
            Provider::OpenAi => ProviderCaps {
                max_chunk_chars: 4096,
                supports_timestamps: false,
                is_async: false,
            },
            Provider::Amazon => ProviderCaps {
                max_chunk_chars: 2800,
                supports_timestamps: true,
                is_async: true,
            },
            Provider::Lemonfox => ProviderCaps {
                max_chunk_chars: 5000,
                supports_timestamps: true,
                is_async: false,
            },
            Provider::VibeVoice => ProviderCaps {
                max_chunk_chars: 3000,
                supports_timestamps: false,
                is_async: false,
            },
        }
    }

    /// All providers, in dispatch-preference order.
    pub fn all() -> &'static [Provider] {
        &[
            Provider::OpenAi,
            Provider::Amazon,
            Provider::Lemonfox,
            Provider::VibeVoice,
        ]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::OpenAi => "openai",
            Provider::Amazon => "amazon",
            Provider::Lemonfox => "lemonfox",
            Provider::VibeVoice => "vibevoice",
        };
        f.write_str(s)
    }
}

impl FromStr for Provider {
    type Err = VoiceSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "amazon" => Ok(Provider::Amazon),
            "lemonfox" => Ok(Provider::Lemonfox),
            "vibevoice" => Ok(Provider::VibeVoice),
            other => Err(VoiceSpecError::UnknownProvider(other.to_string())),
        }
    }
}

/// Errors from parsing or validating a voice selection.
#[derive(Debug, Error, PartialEq)]
pub enum VoiceSpecError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("malformed voice identifier (expected \"provider/voice\"): {0}")]
    MalformedIdentifier(String),

    #[error("speaking rate {0} outside supported range {MIN_SPEAKING_RATE}-{MAX_SPEAKING_RATE}")]
    RateOutOfRange(f32),
}

/// A validated voice selection: provider, voice id, and speaking rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSpec {
    /// The TTS provider to dispatch to.
    pub provider: Provider,
    /// Provider-native voice identifier (e.g. "alloy", "Joanna").
    pub voice_id: String,
    /// Speaking rate multiplier, validated to 0.25–4.0.
    pub speaking_rate: f32,
}

impl VoiceSpec {
    /// Creates a voice spec, rejecting out-of-range speaking rates.
    pub fn new(
        provider: Provider,
        voice_id: impl Into<String>,
        speaking_rate: f32,
    ) -> Result<Self, VoiceSpecError> {
        if !(MIN_SPEAKING_RATE..=MAX_SPEAKING_RATE).contains(&speaking_rate)
            || !speaking_rate.is_finite()
        {
            return Err(VoiceSpecError::RateOutOfRange(speaking_rate));
        }
        Ok(Self {
            provider,
            voice_id: voice_id.into(),
            speaking_rate,
        })
    }

    /// Parses the combined `"provider/voice"` identifier form used by
    /// stored documents and the voice-picker UI. Parsed once here at
    /// the boundary; everything downstream works with the enum.
    pub fn parse_combined(combined: &str, speaking_rate: f32) -> Result<Self, VoiceSpecError> {
        let (provider, voice) = combined
            .split_once('/')
            .ok_or_else(|| VoiceSpecError::MalformedIdentifier(combined.to_string()))?;
        if voice.is_empty() {
            return Err(VoiceSpecError::MalformedIdentifier(combined.to_string()));
        }
        Self::new(provider.parse()?, voice, speaking_rate)
    }

    /// The combined identifier form, for persistence.
    pub fn combined_id(&self) -> String {
        format!("{}/{}", self.provider, self.voice_id)
    }
}
