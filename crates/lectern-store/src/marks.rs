//! NDJSON speech-mark codec.
//!
//! Marks persist as newline-delimited JSON, one mark per line, in the
//! same `{"time","type","start","end","value"}` shape the playback
//! layer consumes. NDJSON appends cheaply and tolerates truncated
//! tails better than one giant array.

use crate::error::StoreError;
use lectern_types::SpeechMark;

/// Encodes marks as NDJSON, one object per line, trailing newline.
pub fn encode_marks(marks: &[SpeechMark]) -> Result<String, StoreError> {
    let mut out = String::new();
    for mark in marks {
        out.push_str(&serde_json::to_string(mark)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decodes NDJSON marks. Blank lines are skipped (writers and
/// network transfers disagree about trailing newlines); a malformed
/// line is an error carrying its 1-based line number.
pub fn decode_marks(input: &str) -> Result<Vec<SpeechMark>, StoreError> {
    let mut marks = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mark = serde_json::from_str(line).map_err(|source| StoreError::MarkDecode {
            line: index + 1,
            source,
        })?;
        marks.push(mark);
    }
    Ok(marks)
}
