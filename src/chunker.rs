//! Deterministic sliding-window chunking.
//!
//! Splits extracted text into consecutive windows of up to `size` chars,
//! advancing by `size - overlap` each step so neighboring chunks share
//! `overlap` chars of context. The final partial window is always retained.
//! The unit is Unicode scalar values (`char`s) and is fixed for the lifetime
//! of an index.

/// A chunk of a source document, positioned by its index in the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Split `text` into overlapping windows.
///
/// Pure function of its inputs: the same `(text, size, overlap)` always
/// yields the same ordered sequence. Empty input yields no chunks.
///
/// # Panics
///
/// `overlap` must be strictly smaller than `size` and `size` must be
/// positive; both are configuration errors checked by `Config::validate`.
#[must_use]
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    assert!(size > 0, "chunk size must be positive");
    assert!(
        overlap < size,
        "chunk overlap ({overlap}) must be strictly smaller than chunk size ({size})"
    );

    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let stride = size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(Chunk {
            index: chunks.len(),
            text: chars[start..end].iter().collect(),
        });
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("short", 100, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "short");
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let text = "a".repeat(100);
        let chunks = split_text(&text, 100, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(split_text("", 100, 20).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text: String = ('a'..='z').cycle().take(5000).collect();
        let a = split_text(&text, 1200, 200);
        let b = split_text(&text, 1200, 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_consecutive_chunks_share_exact_overlap() {
        let text: String = ('a'..='z').cycle().take(3000).collect();
        let size = 500;
        let overlap = 80;
        let chunks = split_text(&text, size, overlap);
        assert!(chunks.len() >= 2);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            // Interior chunks are full-size; their tail equals the next
            // chunk's head, overlap chars long.
            assert_eq!(prev.len(), size);
            let tail: String = prev[size - overlap..].iter().collect();
            let head: String = next[..overlap.min(next.len())].iter().collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_coverage_reconstructs_original() {
        let text: String = "ADGM Companies Regulations 2020, Article 12. "
            .repeat(60)
            .chars()
            .collect();
        let size = 300;
        let overlap = 50;
        let chunks = split_text(&text, size, overlap);

        // First chunk whole, then each subsequent chunk minus its leading
        // overlap, reconstructs the input with no char dropped.
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(&chunk.text);
            } else {
                let rest: String = chunk.text.chars().skip(overlap).collect();
                rebuilt.push_str(&rest);
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_final_partial_chunk_retained() {
        // 1050 chars, size 500, overlap 100 -> starts at 0, 400, 800
        let text = "x".repeat(1050);
        let chunks = split_text(&text, 500, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text.chars().count(), 250);
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn test_multibyte_chars_counted_as_units() {
        let text = "§".repeat(250);
        let chunks = split_text(&text, 100, 10);
        assert_eq!(chunks[0].text.chars().count(), 100);
        let total_indexed: usize = chunks.iter().map(|c| c.index).max().unwrap();
        assert_eq!(total_indexed, chunks.len() - 1);
    }

    #[test]
    #[should_panic(expected = "strictly smaller")]
    fn test_overlap_equal_to_size_panics() {
        split_text("abc", 10, 10);
    }
}
