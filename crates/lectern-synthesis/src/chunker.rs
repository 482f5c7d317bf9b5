//! Provider-constrained text chunking.
//!
//! One parameterized chunker serves every provider; only the `max_len`
//! limit differs per adapter. Splitting prefers sentence boundaries,
//! falls back to the last whitespace in the window, and hard-splits a
//! single giant token as a last resort. Pure text processing: this
//! never fails.

use lectern_types::TextChunk;

/// Characters that can end a sentence.
const SENTENCE_DELIMITERS: [char; 4] = ['.', '?', '!', '\n'];

/// Splits `text` into ordered chunks of at most `max_len` characters.
///
/// Within each window the split point is searched backward:
/// 1. the last sentence delimiter followed by whitespace or the window
///    end (the trailing-boundary check avoids splitting inside tokens
///    like "e.g."),
/// 2. otherwise the last whitespace character,
/// 3. otherwise a hard split at `max_len`.
///
/// Whitespace consumed at split points is trimmed; empty or
/// whitespace-only chunks are dropped. Each chunk records the byte
/// offset of its text in the original string, so
/// `&text[chunk.char_offset..chunk.char_offset + chunk.text.len()]`
/// always equals `chunk.text`.
pub fn split_text(text: &str, max_len: usize) -> Vec<TextChunk> {
    let max_len = max_len.max(1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let window_end = (start + max_len).min(total);
        let split_end = if window_end == total {
            total
        } else {
            sentence_split(&chars, start, window_end)
                .or_else(|| whitespace_split(&chars, start, window_end))
                .unwrap_or(window_end)
        };

        let byte_start = chars[start].0;
        let byte_end = if split_end == total {
            text.len()
        } else {
            chars[split_end].0
        };

        let raw = &text[byte_start..byte_end];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let leading = raw.len() - raw.trim_start().len();
            chunks.push(TextChunk {
                index: chunks.len(),
                text: trimmed.to_string(),
                char_offset: byte_start + leading,
            });
        }

        start = split_end;
    }

    chunks
}

/// Finds the position just after the last sentence delimiter in
/// `[start, window_end)` whose following character is whitespace or the
/// window end.
fn sentence_split(chars: &[(usize, char)], start: usize, window_end: usize) -> Option<usize> {
    for i in (start..window_end).rev() {
        if !SENTENCE_DELIMITERS.contains(&chars[i].1) {
            continue;
        }
        let at_boundary = i + 1 >= window_end
            || i + 1 >= chars.len()
            || chars[i + 1].1.is_whitespace();
        if at_boundary {
            return Some(i + 1);
        }
    }
    None
}

/// Finds the position just after the last whitespace character in
/// `[start, window_end)`.
fn whitespace_split(chars: &[(usize, char)], start: usize, window_end: usize) -> Option<usize> {
    for i in (start..window_end).rev() {
        if chars[i].1.is_whitespace() {
            return Some(i + 1);
        }
    }
    None
}
