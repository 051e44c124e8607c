//! Boundary-preferring text chunker.
//!
//! Splits document text into overlapping segments that respect a configured
//! `max_chars` limit. Within each window the splitter prefers, in order:
//! paragraph breaks (`\n\n`), line breaks, sentence ends (`. `), then word
//! breaks, and hard-cuts at the window edge only when the window contains no
//! boundary at all. Because the boundary search never looks past the window,
//! every produced chunk is at most `max_chars` characters long.
//!
//! Consecutive chunks from the same document overlap by approximately
//! `overlap` characters so that retrieval does not lose text straddling a
//! cut. The transformation is pure and deterministic: identical input and
//! parameters always yield identical chunks.

use crate::models::{Chunk, ChunkMetadata, Document};

pub struct Chunker {
    max_chars: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker. `overlap` is clamped below `max_chars` so the scan
    /// always makes forward progress.
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        assert!(max_chars > 0, "max_chars must be > 0");
        Self {
            max_chars,
            overlap: overlap.min(max_chars.saturating_sub(1)),
        }
    }

    /// Split each document into chunks, inheriting the parent's source path
    /// into every chunk's metadata. Empty input yields empty output.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for text in self.split_text(&doc.text) {
                chunks.push(Chunk {
                    text,
                    metadata: ChunkMetadata::from_source(doc.source_path.clone()),
                });
            }
        }
        chunks
    }

    /// Split one text into overlapping pieces. Whitespace-only input yields
    /// no pieces.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.max_chars {
            return vec![text.to_string()];
        }

        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < text.len() {
            let window_end = floor_char_boundary(text, (start + self.max_chars).min(text.len()));

            // The final window swallows the tail whole; earlier windows cut
            // at the best boundary inside the window.
            let mut end = if window_end == text.len() {
                window_end
            } else {
                match split_offset(&text[start..window_end]) {
                    Some(offset) => start + offset,
                    None => window_end,
                }
            };

            // A window narrower than one character (tiny max_chars on
            // multi-byte input) must still advance.
            if end <= start {
                end = next_char_boundary(text, start + 1);
            }

            let piece = text[start..end].trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }

            if end == text.len() {
                break;
            }

            // Step back for overlap, but never behind the current start.
            let back = floor_char_boundary(text, end.saturating_sub(self.overlap));
            start = if back > start { back } else { end };
        }

        pieces
    }
}

/// Best cut offset inside `window`, or `None` when the window contains no
/// boundary at all. Offsets point just past the separator so it stays with
/// the leading piece.
fn split_offset(window: &str) -> Option<usize> {
    if let Some(pos) = window.rfind("\n\n") {
        return Some(pos + 2);
    }
    if let Some(pos) = window.rfind('\n') {
        return Some(pos + 1);
    }
    if let Some(pos) = window.rfind(". ") {
        return Some(pos + 2);
    }
    if let Some(pos) = window.rfind(' ') {
        return Some(pos + 1);
    }
    None
}

/// Largest char boundary at or below `i`.
fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or above `i`, capped at the text length.
fn next_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document {
            text: text.to_string(),
            source_path: "docs/bio.md".to_string(),
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = Chunker::new(500, 50);
        let pieces = chunker.split_text("Hello, world!");
        assert_eq!(pieces, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_empty_input_no_chunks() {
        let chunker = Chunker::new(500, 50);
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("   \n\n  ").is_empty());
        assert!(chunker.chunk_documents(&[]).is_empty());
    }

    #[test]
    fn test_length_bound_holds() {
        let chunker = Chunker::new(80, 20);
        let text = "word ".repeat(200);
        for piece in chunker.split_text(&text) {
            assert!(
                piece.chars().count() <= 80,
                "chunk exceeds max_chars: {:?}",
                piece
            );
        }
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let chunker = Chunker::new(40, 10);
        let text = "x".repeat(100);
        let pieces = chunker.split_text(&text);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.len() <= 40);
        }
        // Nothing lost: total coverage at least the original length.
        let total: usize = pieces.iter().map(String::len).sum();
        assert!(total >= 100);
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let chunker = Chunker::new(40, 0);
        let text = "First paragraph here.\n\nSecond paragraph continues with more text.";
        let pieces = chunker.split_text(text);
        assert_eq!(pieces[0], "First paragraph here.");
    }

    #[test]
    fn test_prefers_sentence_over_word_boundary() {
        let chunker = Chunker::new(30, 0);
        let text = "One sentence ends. Another one keeps going here";
        let pieces = chunker.split_text(text);
        assert_eq!(pieces[0], "One sentence ends.");
    }

    #[test]
    fn test_overlap_shared_between_neighbors() {
        let chunker = Chunker::new(100, 40);
        let text = (0..120)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let pieces = chunker.split_text(&text);
        assert!(pieces.len() > 2);
        for pair in pieces.windows(2) {
            let head: String = pair[1].chars().take(15).collect();
            assert!(
                pair[0].contains(&head),
                "expected overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(90, 30);
        let text = "Alpha beta gamma. ".repeat(40);
        let first = chunker.split_text(&text);
        let second = chunker.split_text(&text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_inherits_source() {
        let chunker = Chunker::new(60, 10);
        let text = "sentence one goes here. ".repeat(20);
        let chunks = chunker.chunk_documents(&[doc(&text)]);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.source, "docs/bio.md");
        }
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        let chunker = Chunker::new(20, 5);
        let text = "héllo wörld çafé ".repeat(30);
        let pieces = chunker.split_text(&text);
        assert!(!pieces.is_empty());
        for piece in pieces {
            assert!(piece.chars().count() <= 20);
        }
    }
}
