//! Synthesis engine configuration loading from file and environment
//! variables.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// An API key that never appears in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("[UNSET]")
        } else {
            f.write_str("[REDACTED]")
        }
    }
}

/// Top-level synthesis configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesisConfig {
    /// OpenAI speech API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Amazon Polly settings.
    #[serde(default)]
    pub amazon: AmazonConfig,

    /// Lemonfox settings.
    #[serde(default)]
    pub lemonfox: LemonfoxConfig,

    /// VibeVoice settings.
    #[serde(default)]
    pub vibevoice: VibeVoiceConfig,

    /// Job polling settings for async providers.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Outbound HTTP settings shared by all adapters.
    #[serde(default)]
    pub http: HttpConfig,

    /// Audio duration estimation settings.
    #[serde(default)]
    pub audio: AudioConfig,
}

/// OpenAI speech API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: ApiKey,

    /// Speech model identifier.
    #[serde(default = "default_openai_model")]
    pub model: String,
}

/// Amazon Polly settings. The endpoint is a Polly-compatible REST
/// gateway; request signing is handled upstream of this core.
#[derive(Debug, Clone, Deserialize)]
pub struct AmazonConfig {
    #[serde(default = "default_amazon_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: ApiKey,
}

/// Lemonfox settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LemonfoxConfig {
    #[serde(default = "default_lemonfox_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: ApiKey,

    /// Whether to request word-level timestamps with each synthesis
    /// call. Disabling this turns Lemonfox into a plain audio provider.
    #[serde(default = "default_true")]
    pub word_timestamps: bool,
}

/// VibeVoice settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VibeVoiceConfig {
    #[serde(default = "default_vibevoice_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: ApiKey,
}

/// Job polling settings for async providers.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Seconds between status checks. Fixed interval: job durations are
    /// minutes-scale, so a status call every few seconds is cheap
    /// relative to job latency.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Overall wall-clock deadline for one job, independent of how many
    /// ticks fit inside it.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request network timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Audio duration estimation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Nominal encoded audio byte rate, used to estimate a segment's
    /// duration when the provider does not report one. Default matches
    /// 48 kbit/s MP3.
    #[serde(default = "default_estimated_bytes_per_sec")]
    pub estimated_bytes_per_sec: u64,
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "tts-1".to_string()
}

fn default_amazon_endpoint() -> String {
    "https://polly.us-east-1.amazonaws.com".to_string()
}

fn default_lemonfox_endpoint() -> String {
    "https://api.lemonfox.ai".to_string()
}

fn default_vibevoice_endpoint() -> String {
    "http://127.0.0.1:8300".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_timeout_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_estimated_bytes_per_sec() -> u64 {
    6000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            api_key: ApiKey::default(),
            model: default_openai_model(),
        }
    }
}

impl Default for AmazonConfig {
    fn default() -> Self {
        Self {
            endpoint: default_amazon_endpoint(),
            api_key: ApiKey::default(),
        }
    }
}

impl Default for LemonfoxConfig {
    fn default() -> Self {
        Self {
            endpoint: default_lemonfox_endpoint(),
            api_key: ApiKey::default(),
            word_timestamps: true,
        }
    }
}

impl Default for VibeVoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vibevoice_endpoint(),
            api_key: ApiKey::default(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            estimated_bytes_per_sec: default_estimated_bytes_per_sec(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `LECTERN_OPENAI_API_KEY` overrides `openai.api_key`
/// - `LECTERN_AMAZON_API_KEY` overrides `amazon.api_key`
/// - `LECTERN_LEMONFOX_API_KEY` overrides `lemonfox.api_key`
/// - `LECTERN_VIBEVOICE_ENDPOINT` overrides `vibevoice.endpoint`
/// - `LECTERN_POLL_INTERVAL_SECS` overrides `polling.interval_secs`
/// - `LECTERN_POLL_TIMEOUT_SECS` overrides `polling.timeout_secs`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or
/// parsed.
pub fn load_config(path: Option<&str>) -> Result<SynthesisConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                SynthesisConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => SynthesisConfig::default(),
    };

    // Environment variable overrides
    if let Ok(key) = std::env::var("LECTERN_OPENAI_API_KEY") {
        config.openai.api_key = ApiKey::new(key);
    }
    if let Ok(key) = std::env::var("LECTERN_AMAZON_API_KEY") {
        config.amazon.api_key = ApiKey::new(key);
    }
    if let Ok(key) = std::env::var("LECTERN_LEMONFOX_API_KEY") {
        config.lemonfox.api_key = ApiKey::new(key);
    }
    if let Ok(endpoint) = std::env::var("LECTERN_VIBEVOICE_ENDPOINT") {
        config.vibevoice.endpoint = endpoint;
    }
    if let Ok(interval) = std::env::var("LECTERN_POLL_INTERVAL_SECS") {
        if let Ok(parsed) = interval.parse() {
            config.polling.interval_secs = parsed;
        }
    }
    if let Ok(timeout) = std::env::var("LECTERN_POLL_TIMEOUT_SECS") {
        if let Ok(parsed) = timeout.parse() {
            config.polling.timeout_secs = parsed;
        }
    }

    Ok(config)
}
