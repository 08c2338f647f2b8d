//! Recursive character splitting.
//!
//! Text is split on the coarsest separator that occurs in it (paragraphs,
//! then lines, then words, then characters). Pieces that still exceed the
//! chunk size are split again with the finer separators, and small pieces are
//! merged back into windows that overlap by up to `chunk_overlap` characters.

use super::ChunkingConfig;
use crate::error::{HjelperError, Result};
use std::collections::VecDeque;
use tracing::warn;

/// Separators tried in order, coarsest first.
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping windows measured in characters.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(HjelperError::Config("chunk size must be positive".to_string()));
        }
        if config.chunk_overlap > config.chunk_size {
            return Err(HjelperError::Config(format!(
                "chunk overlap ({}) is larger than chunk size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator list.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut finer: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = String::new();
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.clone();
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small = Vec::new();

        for piece in split_keeping_separator(text, &separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Merge small pieces into windows no longer than `chunk_size`.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                if !window.is_empty() {
                    if let Some(doc) = join(&window) {
                        merged.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match window.pop_front() {
                            Some((_, dropped)) => total -= dropped,
                            None => break,
                        }
                    }
                }
            }

            window.push_back((piece.as_str(), len));
            total += len;
        }

        if let Some(doc) = join(&window) {
            merged.push(doc);
        }

        merged
    }
}

/// Split on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let text: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_short_text_is_single_trimmed_chunk() {
        let chunks = splitter(1000, 200).split_text("  hello world  \n");
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(splitter(1000, 200).split_text("").is_empty());
        assert!(splitter(1000, 200).split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_word_split_without_overlap() {
        let chunks = splitter(10, 0).split_text("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_word_split_with_overlap() {
        let chunks = splitter(10, 5).split_text("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let chunks = splitter(10, 0).split_text("abcdefghijklmnop");
        assert_eq!(chunks, vec!["abcdefghij", "klmnop"]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let chunks = splitter(10, 0).split_text("가나다라마바사아자차카");
        assert_eq!(chunks, vec!["가나다라마바사아자차", "카"]);
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let text = "first para\n\nsecond para";
        let chunks = splitter(15, 0).split_text(text);
        assert_eq!(chunks, vec!["first para", "second para"]);
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let text = "lorem ipsum dolor sit amet ".repeat(200);
        for chunk in splitter(100, 20).split_text(&text) {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(RecursiveCharacterSplitter::new(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 200,
        })
        .is_err());
        assert!(RecursiveCharacterSplitter::new(ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
        })
        .is_err());
    }
}
