//! Speech mark alignment.
//!
//! Rebases chunk-local timestamp events onto the assembled audio
//! timeline and the document's global text offsets, producing one
//! sorted, provider-agnostic mark sequence.

use crate::error::AlignmentError;
use lectern_types::{RawMark, SpeechMark, TextChunk};

/// Punctuation tokens that attach to the preceding word without a
/// space, matching the Lemonfox word-stream reconstruction.
fn attaches_to_previous(text: &str) -> bool {
    matches!(text, "," | "." | "?" | "!")
}

/// Aligns every chunk's raw marks into document-global speech marks.
///
/// `time_offsets_sec[i]` is chunk `i`'s start time in the assembled
/// stream (the assembler's cumulative durations). Character offsets use
/// the provider's native chunk-local offset when present, otherwise a
/// running cursor accumulates consumed word lengths.
///
/// Both offsets grow monotonically across chunks, so the concatenated
/// output is already sorted; monotonicity and range validity are still
/// asserted as a data-integrity check, and a violation is an
/// `AlignmentError` the caller downgrades to no-highlight mode rather
/// than failing the request.
pub fn align(
    chunks: &[TextChunk],
    raw_marks_per_chunk: &[Vec<RawMark>],
    time_offsets_sec: &[f64],
    doc_len: usize,
) -> Result<Vec<SpeechMark>, AlignmentError> {
    let mut marks = Vec::new();

    for (chunk, raw_marks) in chunks.iter().zip(raw_marks_per_chunk) {
        let offset_sec = time_offsets_sec.get(chunk.index).copied().unwrap_or(0.0);
        let mut cursor = 0usize;

        for raw in raw_marks {
            let local = match raw.char_start {
                Some(native) => native,
                None => {
                    if cursor > 0 && !attaches_to_previous(&raw.text) {
                        cursor += 1;
                    }
                    let here = cursor;
                    cursor += raw.text.len();
                    here
                }
            };
            if raw.char_start.is_some() {
                cursor = local + raw.text.len();
            }

            let time_ms = ((offset_sec + raw.start_sec).max(0.0) * 1000.0).round() as u64;
            let char_start = chunk.char_offset + local;
            marks.push(SpeechMark {
                time_ms,
                kind: raw.kind,
                char_start,
                char_end: char_start + raw.text.len(),
                value: raw.text.clone(),
            });
        }
    }

    validate(&marks, doc_len)?;
    Ok(marks)
}

/// Asserts mark ordering and text-range invariants.
fn validate(marks: &[SpeechMark], doc_len: usize) -> Result<(), AlignmentError> {
    let mut prev_ms = 0u64;
    for (index, mark) in marks.iter().enumerate() {
        if mark.time_ms < prev_ms {
            return Err(AlignmentError::NonMonotonic {
                index,
                time_ms: mark.time_ms,
                prev_ms,
            });
        }
        prev_ms = mark.time_ms;

        if !mark.in_bounds(doc_len) {
            return Err(AlignmentError::OutOfRange {
                index,
                char_start: mark.char_start,
                char_end: mark.char_end,
                doc_len,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::MarkKind;

    fn chunk(index: usize, text: &str, char_offset: usize) -> TextChunk {
        TextChunk {
            index,
            text: text.to_string(),
            char_offset,
        }
    }

    fn word(text: &str, start_sec: f64, char_start: Option<usize>) -> RawMark {
        RawMark {
            kind: MarkKind::Word,
            start_sec,
            end_sec: start_sec,
            text: text.to_string(),
            char_start,
        }
    }

    #[test]
    fn rebases_times_onto_global_timeline() {
        // Two chunks, five marks each with local starts in [0, 3];
        // chunk 2 starts at 4.2s in the assembled stream.
        let chunks = vec![chunk(0, "a b c d e", 0), chunk(1, "f g h i j", 10)];
        let starts = [0.0f64, 0.7, 1.4, 2.1, 3.0];
        let raw: Vec<Vec<RawMark>> = (0..2)
            .map(|c| {
                "abcdefghij"[c * 5..c * 5 + 5]
                    .chars()
                    .zip(starts)
                    .map(|(ch, t)| word(&ch.to_string(), t, Some(2 * ((ch as usize - 'a' as usize) % 5))))
                    .collect()
            })
            .collect();

        let marks = align(&chunks, &raw, &[0.0, 4.2], 19).unwrap();
        assert_eq!(marks.len(), 10);
        for mark in &marks[5..] {
            assert!(mark.time_ms >= 4200, "chunk 2 mark at {}ms", mark.time_ms);
        }
        assert_eq!(marks[5].time_ms, 4200);
        assert_eq!(marks[5].char_start, 10);
    }

    #[test]
    fn accumulates_offsets_when_provider_has_none() {
        // Chunk text "Hello, world." reconstructed from the word
        // stream with the attach-punctuation rule.
        let chunks = vec![chunk(0, "Hello, world.", 100)];
        let raw = vec![vec![
            word("Hello", 0.0, None),
            word(",", 0.35, None),
            word("world", 0.5, None),
            word(".", 0.9, None),
        ]];
        let marks = align(&chunks, &raw, &[0.0], 200).unwrap();
        assert_eq!(marks[0].char_start, 100);
        assert_eq!(marks[1].char_start, 105);
        assert_eq!(marks[2].char_start, 107);
        assert_eq!(marks[3].char_start, 112);
        assert_eq!(marks[2].value, "world");
    }

    #[test]
    fn chunks_without_marks_emit_nothing() {
        let chunks = vec![chunk(0, "silent text", 0), chunk(1, "spoken", 12)];
        let raw = vec![Vec::new(), vec![word("spoken", 0.0, Some(0))]];
        let marks = align(&chunks, &raw, &[0.0, 2.0], 18).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].time_ms, 2000);
    }

    #[test]
    fn output_is_monotonic() {
        let chunks = vec![chunk(0, "a b", 0), chunk(1, "c d", 4)];
        let raw = vec![
            vec![word("a", 0.0, Some(0)), word("b", 0.5, Some(2))],
            vec![word("c", 0.1, Some(0)), word("d", 0.6, Some(2))],
        ];
        let marks = align(&chunks, &raw, &[0.0, 1.0], 7).unwrap();
        for pair in marks.windows(2) {
            assert!(pair[0].time_ms <= pair[1].time_ms);
        }
    }

    #[test]
    fn detects_non_monotonic_marks() {
        // A bogus negative time offset for chunk 1 drags its marks
        // before chunk 0's.
        let chunks = vec![chunk(0, "a", 0), chunk(1, "b", 2)];
        let raw = vec![
            vec![word("a", 5.0, Some(0))],
            vec![word("b", 0.0, Some(0))],
        ];
        let err = align(&chunks, &raw, &[0.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, AlignmentError::NonMonotonic { index: 1, .. }));
    }

    #[test]
    fn detects_out_of_range_marks() {
        let chunks = vec![chunk(0, "tiny", 0)];
        let raw = vec![vec![word("enormous", 0.0, Some(0))]];
        let err = align(&chunks, &raw, &[0.0], 4).unwrap_err();
        assert!(matches!(err, AlignmentError::OutOfRange { .. }));
    }

    #[test]
    fn negative_times_clamp_to_zero() {
        let chunks = vec![chunk(0, "x", 0)];
        let raw = vec![vec![word("x", -0.2, Some(0))]];
        let marks = align(&chunks, &raw, &[0.0], 1).unwrap();
        assert_eq!(marks[0].time_ms, 0);
    }
}
