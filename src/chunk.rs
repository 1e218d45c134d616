//! Fixed-size overlapping text chunker.
//!
//! Splits normalized document text into character windows of a bounded
//! length with a fixed overlap between neighbors, the unit of embedding
//! storage. Deterministic: the same text and limits always produce the
//! same chunks.

/// Split `text` into windows of at most `chunk_size` characters, each
/// sharing `chunk_overlap` characters with its predecessor.
///
/// Empty text produces no chunks. `chunk_overlap` must be smaller than
/// `chunk_size` (enforced at config load); a degenerate overlap still
/// advances by at least one character.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
