//! Splits a document's text into fragments for embedding and search.
//! Fragments are fixed-size windows of whitespace-separated words.

use serde::{Deserialize, Serialize};

/// Default number of words per fragment.
pub const DEFAULT_WORDS_PER_CHUNK: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Words per fragment. Zero is treated as one.
    pub words_per_chunk: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            words_per_chunk: DEFAULT_WORDS_PER_CHUNK,
        }
    }
}

impl ChunkOptions {
    pub fn with_words(words_per_chunk: usize) -> Self {
        Self { words_per_chunk }
    }
}

/// Split `text` into consecutive windows of `words_per_chunk` words, each rejoined with
/// single spaces. The last window may be shorter. Whitespace-only text yields nothing.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    let size = options.words_per_chunk.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|w| w.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn chunk_short_text() {
        let c = chunk_text("One short paragraph.", &ChunkOptions::default());
        assert_eq!(c, vec!["One short paragraph.".to_string()]);
    }

    #[test]
    fn chunk_by_word_windows() {
        let c = chunk_text("a b c d e f g", &ChunkOptions::with_words(3));
        assert_eq!(c, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn whitespace_is_normalized() {
        let c = chunk_text("  the\tcat\n\nsat   on\r\nthe mat ", &ChunkOptions::with_words(3));
        assert_eq!(c, vec!["the cat sat", "on the mat"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text(" \n\t ", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn zero_words_means_one() {
        let c = chunk_text("x y", &ChunkOptions::with_words(0));
        assert_eq!(c, vec!["x", "y"]);
    }

    #[test]
    fn long_text_uses_default_window() {
        let text = vec!["w"; 250].join(" ");
        let c = chunk_text(&text, &ChunkOptions::default());
        assert_eq!(c.len(), 3);
        assert_eq!(c[0].split(' ').count(), 100);
        assert_eq!(c[2].split(' ').count(), 50);
    }
}
