//! Audio segment and generation-status types.

use serde::{Deserialize, Serialize};

/// One chunk's synthesized audio, ordered by `index` and contiguous in
/// the assembled stream: segment N starts exactly where segment N-1
/// ends.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Chunk position this segment was synthesized from.
    pub index: usize,
    /// Encoded audio bytes. All segments of one request share codec
    /// parameters (same provider, voice, bitrate), which is what makes
    /// plain concatenation valid.
    pub bytes: Vec<u8>,
    /// Playable duration. Provider-reported when available, otherwise
    /// estimated from byte length and a nominal byte rate.
    pub duration_sec: f64,
}

/// Durable progress signal on a document's audio generation.
///
/// This is the only job-progress state visible outside the synthesis
/// core; callers observe it on the stored document record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioGenerationStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}
