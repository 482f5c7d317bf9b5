//! Document records and the audio generation status machine.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use lectern_types::AudioGenerationStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored document's audio state.
///
/// The text itself and the reader-facing metadata live elsewhere; this
/// record tracks only what synthesis produces and where it went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,

    /// Where the assembled audio landed, once generation completed.
    pub audio_url: Option<String>,

    /// Where the NDJSON speech marks landed; absent when the provider
    /// path produced no timestamps.
    pub marks_url: Option<String>,

    pub audio_status: AudioGenerationStatus,

    /// Total audio duration in seconds, once known.
    pub audio_duration_sec: Option<f64>,

    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            audio_url: None,
            marks_url: None,
            audio_status: AudioGenerationStatus::Idle,
            audio_duration_sec: None,
            updated_at: Utc::now(),
        }
    }

    /// Applies a status transition, refusing illegal ones.
    ///
    /// Legal moves: `Idle | Failed → Processing`,
    /// `Processing → Completed | Failed`. Everything else is an error;
    /// in particular a document already `Processing` rejects a second
    /// generation request instead of running two synthesis jobs.
    pub fn transition(&mut self, to: AudioGenerationStatus) -> Result<(), StoreError> {
        use AudioGenerationStatus::{Completed, Failed, Idle, Processing};
        let legal = matches!(
            (self.audio_status, to),
            (Idle, Processing) | (Failed, Processing) | (Processing, Completed) | (Processing, Failed)
        );
        if !legal {
            return Err(StoreError::InvalidTransition {
                from: self.audio_status,
                to,
            });
        }
        self.audio_status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
