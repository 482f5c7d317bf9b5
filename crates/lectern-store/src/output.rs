//! Audio delivery formats.
//!
//! Short-lived results travel inline as a data URI the player can use
//! directly; persisted results are referenced by blob URL. Which form a
//! request gets is decided by whether it is tied to a stored document.

use base64::Engine as _;
use lectern_types::SpeechMark;
use serde::{Deserialize, Serialize};

/// MIME type of the assembled audio stream.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mp3";

/// MIME type of the NDJSON speech-mark file.
pub const MARKS_CONTENT_TYPE: &str = "application/x-ndjson";

/// A synthesis result in deliverable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AudioOutput {
    /// Audio embedded as a `data:` URI, marks carried in the response
    /// itself. For ephemeral, short-form synthesis.
    Inline {
        data_uri: String,
        marks: Vec<SpeechMark>,
    },
    /// Audio and marks uploaded to blob storage, referenced by URL.
    Stored {
        audio_url: String,
        marks_url: Option<String>,
    },
}

/// Encodes audio bytes as a playable `data:audio/mp3;base64,` URI.
pub fn audio_data_uri(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{AUDIO_CONTENT_TYPE};base64,{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_has_playable_prefix() {
        let uri = audio_data_uri(b"abc");
        assert!(uri.starts_with("data:audio/mp3;base64,"));
        assert_eq!(uri, "data:audio/mp3;base64,YWJj");
    }

    #[test]
    fn empty_audio_still_forms_a_uri() {
        assert_eq!(audio_data_uri(b""), "data:audio/mp3;base64,");
    }
}
