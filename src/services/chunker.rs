//! Word-window chunking with overlap for embedding.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ChunkError;
use crate::models::ChunkingConfig;

static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid whitespace pattern"));

/// Text chunker that splits documents into overlapping windows of
/// whitespace-delimited words.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Words per chunk
    chunk_size: usize,
    /// Words shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_size` must be positive and greater than `overlap`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 || chunk_size <= overlap {
            return Err(ChunkError::InvalidParameters {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ChunkError> {
        Self::new(config.chunk_size as usize, config.overlap as usize)
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self {
            chunk_size: crate::models::DEFAULT_CHUNK_SIZE as usize,
            overlap: crate::models::DEFAULT_CHUNK_OVERLAP as usize,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split text into overlapping word windows.
    ///
    /// Each window starts `chunk_size - overlap` words after the previous one
    /// and holds up to `chunk_size` words joined by single spaces; the last
    /// window may be shorter. Empty or whitespace-only text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        let words: Vec<&str> = normalized.split_whitespace().collect();

        let mut chunks = Vec::with_capacity(expected_chunks(words.len(), self.stride()));
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            start += self.stride();
        }

        chunks
    }
}

/// Number of windows `split` produces for `words` words at the given stride.
fn expected_chunks(words: usize, stride: usize) -> usize {
    words.div_ceil(stride)
}

/// Replace non-breaking spaces, collapse runs of spaces and tabs, and trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace('\u{00A0}', " ");
    HORIZONTAL_WHITESPACE
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_example_windows() {
        let chunker = TextChunker::new(3, 1).unwrap();
        assert_eq!(chunker.split("a b c d e"), vec!["a b c", "c d e", "e"]);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(5, 5).is_err());
        assert!(TextChunker::new(5, 7).is_err());
        assert!(TextChunker::new(5, 4).is_ok());
        assert!(TextChunker::new(1, 0).is_ok());
    }

    #[test]
    fn test_empty_document() {
        let chunker = TextChunker::with_defaults();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split(" \t\u{00A0}\n  ").is_empty());
    }

    #[test]
    fn test_small_document_single_chunk() {
        let chunker = TextChunker::with_defaults();
        assert_eq!(chunker.split("Hello,   world!"), vec!["Hello, world!"]);
    }

    #[test]
    fn test_no_overlap() {
        let chunker = TextChunker::new(2, 0).unwrap();
        assert_eq!(chunker.split("a b c d e"), vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_whitespace("  a\u{00A0}\u{00A0}b\t\tc  "), "a b c");
        let chunker = TextChunker::new(10, 2).unwrap();
        assert_eq!(chunker.split("one\ntwo\r\n\tthree"), vec!["one two three"]);
    }

    #[test]
    fn test_chunk_count_matches_stride() {
        // (tokens, chunk_size, overlap, expected)
        let cases = [
            (5, 3, 1, 3),
            (6, 3, 1, 3),
            (7, 3, 1, 4),
            (10, 4, 2, 5),
            (1, 4, 2, 1),
            (800, 800, 120, 2),
            (681, 800, 120, 2),
            (680, 800, 120, 1),
        ];
        for (n, c, o, expected) in cases {
            let chunker = TextChunker::new(c, o).unwrap();
            let chunks = chunker.split(&words(n));
            assert_eq!(chunks.len(), expected, "n={n} c={c} o={o}");
            assert_eq!(expected_chunks(n, c - o), expected);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let chunks = chunker.split(&words(23));
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split(' ').collect();
            let next: Vec<&str> = pair[1].split(' ').collect();
            if prev.len() == 5 {
                assert_eq!(&prev[prev.len() - 2..], &next[..2.min(next.len())]);
            }
        }
    }

    #[test]
    fn test_every_token_covered_in_order() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let text = words(17);
        let chunks = chunker.split(&text);

        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let tokens = chunk.split(' ');
            let skip = if i == 0 { 0 } else { chunker.overlap() };
            rebuilt.extend(tokens.skip(skip).map(String::from));
        }
        assert_eq!(rebuilt.join(" "), text);
    }

    #[test]
    fn test_deterministic() {
        let chunker = TextChunker::new(7, 3).unwrap();
        let text = words(50);
        assert_eq!(chunker.split(&text), chunker.split(&text));
    }
}
