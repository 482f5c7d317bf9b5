//! Persistence glue between the synthesis engine and storage.
//!
//! Status flows `Idle → Processing → Completed | Failed` on the
//! document record; the caller brackets a synthesis run with
//! `begin_generation` and one of `complete_generation` /
//! `fail_generation`. Requests without a document id skip storage
//! entirely and deliver inline.

use crate::error::StoreError;
use crate::marks::encode_marks;
use crate::output::{audio_data_uri, AudioOutput, AUDIO_CONTENT_TYPE, MARKS_CONTENT_TYPE};
use crate::store::{BlobStore, DocumentStore};
use lectern_types::{AudioGenerationStatus, SpeechMark};
use uuid::Uuid;

/// Marks a document as generating. Fails if a generation is already in
/// flight, which is the concurrency guard for duplicate requests.
pub async fn begin_generation<D: DocumentStore>(docs: &D, id: Uuid) -> Result<(), StoreError> {
    let mut record = docs.fetch(id).await?;
    record.transition(AudioGenerationStatus::Processing)?;
    docs.update(record).await?;
    tracing::info!(document = %id, "audio generation started");
    Ok(())
}

/// Uploads a finished synthesis result and completes the record.
///
/// Audio goes to `audio/{id}.mp3`, marks (when present) to
/// `marks/{id}.ndjson`. An empty mark set stores no marks file, so the
/// record reflects that highlighting is unavailable.
pub async fn complete_generation<B: BlobStore, D: DocumentStore>(
    blobs: &B,
    docs: &D,
    id: Uuid,
    audio: Vec<u8>,
    marks: &[SpeechMark],
    duration_sec: f64,
) -> Result<AudioOutput, StoreError> {
    let audio_url = blobs
        .put(&format!("audio/{id}.mp3"), audio, AUDIO_CONTENT_TYPE)
        .await?;

    let marks_url = if marks.is_empty() {
        None
    } else {
        let ndjson = encode_marks(marks)?;
        Some(
            blobs
                .put(
                    &format!("marks/{id}.ndjson"),
                    ndjson.into_bytes(),
                    MARKS_CONTENT_TYPE,
                )
                .await?,
        )
    };

    let mut record = docs.fetch(id).await?;
    record.transition(AudioGenerationStatus::Completed)?;
    record.audio_url = Some(audio_url.clone());
    record.marks_url = marks_url.clone();
    record.audio_duration_sec = Some(duration_sec);
    docs.update(record).await?;

    tracing::info!(
        document = %id,
        marks = marks.len(),
        duration_sec,
        "audio generation completed"
    );
    Ok(AudioOutput::Stored {
        audio_url,
        marks_url,
    })
}

/// Marks a generation as failed so the document can be retried.
pub async fn fail_generation<D: DocumentStore>(
    docs: &D,
    id: Uuid,
    reason: &str,
) -> Result<(), StoreError> {
    let mut record = docs.fetch(id).await?;
    record.transition(AudioGenerationStatus::Failed)?;
    docs.update(record).await?;
    tracing::warn!(document = %id, reason, "audio generation failed");
    Ok(())
}

/// Wraps a result for immediate playback without touching storage.
pub fn inline_output(audio: &[u8], marks: Vec<SpeechMark>) -> AudioOutput {
    AudioOutput::Inline {
        data_uri: audio_data_uri(audio),
        marks,
    }
}

/// Delivers a synthesis result, persisted or inline depending on
/// whether the request is tied to a stored document.
pub async fn deliver<B: BlobStore, D: DocumentStore>(
    blobs: &B,
    docs: &D,
    doc_id: Option<Uuid>,
    audio: Vec<u8>,
    marks: Vec<SpeechMark>,
    duration_sec: f64,
) -> Result<AudioOutput, StoreError> {
    match doc_id {
        Some(id) => complete_generation(blobs, docs, id, audio, &marks, duration_sec).await,
        None => Ok(inline_output(&audio, marks)),
    }
}
