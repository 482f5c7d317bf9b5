//! Audio segment assembly.
//!
//! Concatenates per-chunk audio into one continuous stream. Valid only
//! because all segments of one request share codec parameters (same
//! provider, voice, bitrate); cross-provider concatenation is never
//! attempted within one request.

use crate::error::AssemblyError;
use lectern_types::AudioSegment;

/// The assembled stream plus each segment's time offset into it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledAudio {
    /// All segment bytes, concatenated in index order.
    pub bytes: Vec<u8>,
    /// `cumulative_sec[i]` is where segment `i` starts in the stream:
    /// the sum of durations of segments `0..i`. Used by the aligner as
    /// each chunk's time offset.
    pub cumulative_sec: Vec<f64>,
    /// Total duration of the assembled stream.
    pub total_sec: f64,
}

/// Estimates a segment's duration from its byte length and a nominal
/// encoded byte rate.
///
/// Estimation error accumulates across segments; it is an accepted
/// limitation, corrected only once real playback metadata is available
/// on the client, never retroactively in stored marks.
pub fn estimate_duration_sec(byte_len: usize, bytes_per_sec: u64) -> f64 {
    byte_len as f64 / bytes_per_sec.max(1) as f64
}

/// Concatenates segments in index order.
///
/// Segments must arrive sorted by `index` with no gaps and no empty
/// byte buffers; either condition is an `AssemblyError`.
pub fn assemble(segments: &[AudioSegment]) -> Result<AssembledAudio, AssemblyError> {
    let mut bytes = Vec::with_capacity(segments.iter().map(|s| s.bytes.len()).sum());
    let mut cumulative_sec = Vec::with_capacity(segments.len());
    let mut elapsed = 0.0f64;

    for (position, segment) in segments.iter().enumerate() {
        if segment.index != position {
            return Err(AssemblyError::OutOfOrder {
                position,
                found: segment.index,
            });
        }
        if segment.bytes.is_empty() {
            return Err(AssemblyError::EmptySegment {
                index: segment.index,
            });
        }
        cumulative_sec.push(elapsed);
        bytes.extend_from_slice(&segment.bytes);
        elapsed += segment.duration_sec;
    }

    Ok(AssembledAudio {
        bytes,
        cumulative_sec,
        total_sec: elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(index: usize, bytes: &[u8], duration_sec: f64) -> AudioSegment {
        AudioSegment {
            index,
            bytes: bytes.to_vec(),
            duration_sec,
        }
    }

    #[test]
    fn concatenates_in_order_with_offsets() {
        let segments = vec![
            segment(0, b"aaaa", 2.0),
            segment(1, b"bb", 1.5),
            segment(2, b"ccc", 0.5),
        ];
        let assembled = assemble(&segments).unwrap();
        assert_eq!(assembled.bytes, b"aaaabbccc");
        assert_eq!(assembled.cumulative_sec, vec![0.0, 2.0, 3.5]);
        assert!((assembled.total_sec - 4.0).abs() < 1e-9);
    }

    #[test]
    fn single_segment_starts_at_zero() {
        let assembled = assemble(&[segment(0, b"audio", 3.2)]).unwrap();
        assert_eq!(assembled.cumulative_sec, vec![0.0]);
        assert_eq!(assembled.bytes, b"audio");
    }

    #[test]
    fn empty_segment_is_fatal() {
        let segments = vec![segment(0, b"aa", 1.0), segment(1, b"", 1.0)];
        assert!(matches!(
            assemble(&segments),
            Err(AssemblyError::EmptySegment { index: 1 })
        ));
    }

    #[test]
    fn out_of_order_segments_are_rejected() {
        let segments = vec![segment(1, b"bb", 1.0), segment(0, b"aa", 1.0)];
        assert!(matches!(
            assemble(&segments),
            Err(AssemblyError::OutOfOrder { position: 0, found: 1 })
        ));
    }

    #[test]
    fn no_segments_assembles_empty() {
        let assembled = assemble(&[]).unwrap();
        assert!(assembled.bytes.is_empty());
        assert!(assembled.cumulative_sec.is_empty());
    }

    #[test]
    fn estimates_duration_from_byte_rate() {
        assert!((estimate_duration_sec(12_000, 6000) - 2.0).abs() < 1e-9);
        // Degenerate byte rate never divides by zero.
        assert!(estimate_duration_sec(100, 0).is_finite());
    }
}
