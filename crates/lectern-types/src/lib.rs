//! Shared data model for the Lectern speech synthesis core.
//!
//! Defines the provider-agnostic types that flow through the synthesis
//! pipeline: text chunks, voice specifications, raw provider timestamp
//! events, aligned speech marks, and audio segments. The synthesis
//! engine (`lectern-synthesis`) produces these; the storage layer
//! (`lectern-store`) persists them; the web client consumes them for
//! read-along highlighting.

pub mod audio;
pub mod mark;
pub mod voice;

pub use audio::{AudioGenerationStatus, AudioSegment};
pub use mark::{marks_of_kind, MarkKind, RawMark, SpeechMark};
pub use voice::{Provider, ProviderCaps, VoiceSpec, VoiceSpecError};

use serde::{Deserialize, Serialize};

/// A bounded-length slice of document text dispatched as one synthesis
/// call.
///
/// Chunks are produced in document order. Concatenating their text
/// reproduces the source document, modulo the single whitespace
/// character consumed at each split point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of this chunk in the dispatch order (0-based).
    pub index: usize,
    /// The text to synthesize.
    pub text: String,
    /// Byte offset of `text` within the original document string.
    pub char_offset: usize,
}

/// Maps an absolute character offset in the document text to a 0-based
/// page number, given the offsets at which each page begins.
///
/// `page_offsets` must be sorted ascending, with `page_offsets[0] == 0`
/// for a well-formed document. Offsets past the last page map to the
/// last page. Used by the reader UI to scroll the highlighted page into
/// view; the synthesis core itself never consults page boundaries.
pub fn page_for_offset(page_offsets: &[usize], char_offset: usize) -> usize {
    if page_offsets.is_empty() {
        return 0;
    }
    let after = page_offsets.partition_point(|&start| start <= char_offset);
    after.saturating_sub(1)
}
