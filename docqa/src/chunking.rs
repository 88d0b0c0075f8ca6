//! Splitting source text into overlapping chunks.
//!
//! This module provides the [`Chunker`] trait and [`BoundaryChunker`], a
//! greedy splitter that respects sentence and word boundaries where it can
//! while guaranteeing exact character overlap between adjacent chunks.

use crate::document::Chunk;
use crate::error::{Error, Result};

/// A strategy for splitting raw text into an ordered chunk sequence.
///
/// Implementations produce [`Chunk`]s with stable zero-based indices.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split text into chunks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `text` is empty.
    fn split(&self, text: &str) -> Result<Vec<Chunk>>;
}

/// Greedy chunker with configurable size and exact overlap.
///
/// Sizes are measured in characters, never bytes, so multi-byte text is
/// split safely. Each chunk holds at most `chunk_size` characters; when a
/// chunk does not end the text, the cut point is pulled back to the latest
/// sentence boundary (or, failing that, word boundary) inside the window,
/// and the next chunk starts exactly `overlap` characters before the cut.
///
/// Two invariants hold for every split:
///
/// - every character of the source appears in at least one chunk;
/// - adjacent chunks share exactly `overlap` characters of context.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::chunking::{BoundaryChunker, Chunker};
///
/// let chunker = BoundaryChunker::new(512, 50)?;
/// let chunks = chunker.split(&document.text)?;
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless `chunk_size > overlap`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size <= overlap {
            return Err(Error::InvalidInput(format!(
                "chunk_size ({chunk_size}) must be greater than chunk_overlap ({overlap})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Choose where to cut a chunk that starts at char `start` and may
    /// extend to char `hard_end` (exclusive, strictly inside the text).
    ///
    /// Prefers the latest sentence end, then the latest word boundary,
    /// then `hard_end`. The cut always lands strictly after
    /// `start + overlap` so the next chunk makes forward progress.
    fn cut_point(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let min_cut = start + self.overlap + 1;

        // Sentence boundary: cut right after terminal punctuation or a newline.
        for cut in (min_cut..=hard_end).rev() {
            if matches!(chars[cut - 1], '.' | '!' | '?' | '\n') {
                return cut;
            }
        }

        // Word boundary: cut right after whitespace.
        for cut in (min_cut..=hard_end).rev() {
            if chars[cut - 1].is_whitespace() {
                return cut;
            }
        }

        hard_end
    }
}

impl Chunker for BoundaryChunker {
    fn split(&self, text: &str) -> Result<Vec<Chunk>> {
        if text.is_empty() {
            return Err(Error::InvalidInput("text must not be empty".to_string()));
        }

        // Byte offset of every char boundary, plus the end of the text,
        // so char windows can be sliced without splitting a codepoint.
        let bounds: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = bounds.len() - 1;
        let chars: Vec<char> = text.chars().collect();

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let hard_end = (start + self.chunk_size).min(char_count);
            let end = if hard_end < char_count {
                self.cut_point(&chars, start, hard_end)
            } else {
                hard_end
            };

            chunks.push(Chunk {
                index: chunks.len(),
                text: text[bounds[start]..bounds[end]].to_string(),
            });

            if end == char_count {
                break;
            }
            start = end - self.overlap;
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn rejects_chunk_size_not_above_overlap() {
        assert!(matches!(BoundaryChunker::new(50, 50), Err(Error::InvalidInput(_))));
        assert!(matches!(BoundaryChunker::new(10, 20), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_text() {
        let chunker = BoundaryChunker::new(20, 5).unwrap();
        assert!(matches!(chunker.split(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunker = BoundaryChunker::new(512, 50).unwrap();
        let chunks = chunker.split("just a short note").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "just a short note");
    }

    #[test]
    fn three_sentences_cover_and_overlap() {
        let text = "Sentence one. Sentence two. Sentence three.";
        let chunker = BoundaryChunker::new(20, 5).unwrap();
        let chunks = chunker.split(text).unwrap();
        assert!(chunks.len() > 1);

        // Indices are sequential.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(char_len(&chunk.text) <= 20);
        }

        // Adjacent chunks share exactly five characters of context.
        for pair in chunks.windows(2) {
            let tail: String =
                pair[0].text.chars().skip(char_len(&pair[0].text) - 5).collect();
            let head: String = pair[1].text.chars().take(5).collect();
            assert_eq!(tail, head);
        }

        // Dropping each chunk's leading overlap reconstructs the source.
        let mut rebuilt: String = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(5));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn prefers_sentence_boundaries() {
        let text = "First sentence here. Second sentence follows after it.";
        let chunker = BoundaryChunker::new(30, 4).unwrap();
        let chunks = chunker.split(text).unwrap();
        assert!(chunks[0].text.trim_end().ends_with('.'));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld. ".repeat(20);
        let chunker = BoundaryChunker::new(25, 6).unwrap();
        let chunks = chunker.split(&text).unwrap();
        for chunk in &chunks {
            assert!(char_len(&chunk.text) <= 25);
        }
        let mut rebuilt: String = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(6));
        }
        assert_eq!(rebuilt, text);
    }
}
