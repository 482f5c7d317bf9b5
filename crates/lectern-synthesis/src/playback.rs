//! Playback position to speech-mark resolution.
//!
//! The reader queries this on every playback timer tick (4–10 times a
//! second), and long documents can carry thousands of marks, so lookup
//! is a binary search rather than a scan.

use lectern_types::SpeechMark;

/// Returns the last mark whose `time_ms <= position_ms`: the most
/// recently started mark at the given playback position.
///
/// `marks` must be sorted ascending by `time_ms` (the aligner's output
/// order). Returns `None` when `marks` is empty or the position
/// precedes the first mark. Kind-agnostic: callers pre-filter with
/// `marks_of_kind` when they want word-only or sentence-only lookup.
pub fn current_mark(marks: &[SpeechMark], position_ms: u64) -> Option<&SpeechMark> {
    let after = marks.partition_point(|m| m.time_ms <= position_ms);
    after.checked_sub(1).map(|i| &marks[i])
}
