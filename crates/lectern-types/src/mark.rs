//! Speech mark types.
//!
//! `RawMark` is a provider-native timestamp event, local to one chunk:
//! times are relative to that chunk's audio segment and offsets to that
//! chunk's text. The aligner rebases raw marks into `SpeechMark`s,
//! which carry absolute positions in the assembled audio stream and the
//! original document text.

use serde::{Deserialize, Serialize};

/// Granularity of a timestamp event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Word,
    Sentence,
}

/// A provider-native timestamp event, relative to one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMark {
    pub kind: MarkKind,
    /// Seconds from the start of the chunk's own audio segment.
    pub start_sec: f64,
    /// Seconds from the start of the chunk's own audio segment.
    pub end_sec: f64,
    /// The spoken token or sentence text.
    pub text: String,
    /// Character offset of `text` within the chunk, when the provider
    /// reports native offsets (Polly). `None` when the adapter must
    /// reconstruct offsets by accumulation (Lemonfox).
    pub char_start: Option<usize>,
}

/// A provider-agnostic, document-global speech mark.
///
/// Serialized field names match the persisted newline-delimited JSON
/// format the web client parses line by line:
/// `{"time":<ms>,"type":"word","start":<int>,"end":<int>,"value":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechMark {
    /// Milliseconds from the start of the assembled audio stream.
    #[serde(rename = "time")]
    pub time_ms: u64,
    /// Word or sentence granularity.
    #[serde(rename = "type")]
    pub kind: MarkKind,
    /// Absolute character offset into the document text (inclusive).
    #[serde(rename = "start")]
    pub char_start: usize,
    /// Absolute character offset into the document text (exclusive).
    #[serde(rename = "end")]
    pub char_end: usize,
    /// The highlighted text.
    pub value: String,
}

impl SpeechMark {
    /// True if this mark's character range lies inside a document of
    /// `doc_len` bytes.
    pub fn in_bounds(&self, doc_len: usize) -> bool {
        self.char_start < self.char_end && self.char_end <= doc_len
    }
}

/// Filters a mark slice down to one granularity, preserving order.
///
/// Playback typically queries word-level marks for fine highlighting
/// and falls back to sentence-level when a provider only produced
/// those.
pub fn marks_of_kind(marks: &[SpeechMark], kind: MarkKind) -> Vec<SpeechMark> {
    marks.iter().filter(|m| m.kind == kind).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_mark_uses_wire_field_names() {
        let mark = SpeechMark {
            time_ms: 1250,
            kind: MarkKind::Word,
            char_start: 10,
            char_end: 15,
            value: "hello".to_string(),
        };
        let json = serde_json::to_value(&mark).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "time": 1250,
                "type": "word",
                "start": 10,
                "end": 15,
                "value": "hello"
            })
        );
    }

    #[test]
    fn speech_mark_round_trips() {
        let line = r#"{"time":0,"type":"sentence","start":0,"end":12,"value":"Hello world."}"#;
        let mark: SpeechMark = serde_json::from_str(line).unwrap();
        assert_eq!(mark.kind, MarkKind::Sentence);
        assert_eq!(serde_json::to_string(&mark).unwrap(), line);
    }

    #[test]
    fn in_bounds_checks_range() {
        let mark = SpeechMark {
            time_ms: 0,
            kind: MarkKind::Word,
            char_start: 5,
            char_end: 10,
            value: "abcde".to_string(),
        };
        assert!(mark.in_bounds(10));
        assert!(!mark.in_bounds(9));
        let empty = SpeechMark {
            char_end: 5,
            ..mark
        };
        assert!(!empty.in_bounds(10));
    }

    #[test]
    fn marks_of_kind_filters_and_preserves_order() {
        let marks = vec![
            SpeechMark {
                time_ms: 0,
                kind: MarkKind::Sentence,
                char_start: 0,
                char_end: 12,
                value: "Hello world.".to_string(),
            },
            SpeechMark {
                time_ms: 0,
                kind: MarkKind::Word,
                char_start: 0,
                char_end: 5,
                value: "Hello".to_string(),
            },
            SpeechMark {
                time_ms: 300,
                kind: MarkKind::Word,
                char_start: 6,
                char_end: 11,
                value: "world".to_string(),
            },
        ];
        let words = marks_of_kind(&marks, MarkKind::Word);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].value, "Hello");
        assert_eq!(words[1].value, "world");
    }
}
