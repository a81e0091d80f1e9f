//! Text chunking with structural boundaries and overlap
//!
//! Text is split at the highest-priority boundary that occurs in it (section
//! headers, then list items, then line breaks, then sentences). Pieces that
//! are still too large are split again at the next boundary, and as a last
//! resort hard-cut at the size budget. Pieces are then merged back greedily up
//! to the budget, carrying trailing pieces of each chunk into the next one as
//! overlap. All sizes are in characters.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, SourceDocument};

/// Split points, highest priority first
#[derive(Debug, Clone, Copy)]
enum Boundary {
    /// A literal marker that starts the next piece
    Marker(&'static str),
    /// Unicode sentence boundaries
    Sentence,
}

const BOUNDARIES: [Boundary; 4] = [
    Boundary::Marker("\n## "),
    Boundary::Marker("\n- "),
    Boundary::Marker("\n"),
    Boundary::Sentence,
];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Target chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between chunks
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every document, preserving document order
    pub fn chunk_documents(&self, docs: &[SourceDocument]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    /// Chunk a single document
    pub fn chunk_document(&self, doc: &SourceDocument) -> Vec<Chunk> {
        self.split_text(&doc.raw_text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(doc, text, i as u32))
            .collect()
    }

    /// Split raw text into trimmed, non-empty chunk texts
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &BOUNDARIES)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, boundaries: &[Boundary]) -> Vec<String> {
        // Use the first boundary that actually splits this text
        let mut remaining = boundaries;
        let mut pieces = Vec::new();
        while let Some((boundary, rest)) = remaining.split_first() {
            remaining = rest;
            pieces = split_at_boundary(text, *boundary);
            if pieces.len() > 1 {
                break;
            }
        }

        if pieces.len() <= 1 {
            return if char_len(text) <= self.chunk_size {
                vec![text.to_string()]
            } else {
                self.hard_split(text)
            };
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            chunks.extend(self.split_recursive(piece, remaining));
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks
    }

    /// Greedily join pieces up to the size budget, seeding each new chunk
    /// with the trailing pieces of the previous one
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());

                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());
        }

        chunks
    }

    /// Cut text into windows of `chunk_size` characters overlapping by `overlap`
    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Split text at a boundary. Markers stay attached to the piece they start.
fn split_at_boundary(text: &str, boundary: Boundary) -> Vec<&str> {
    match boundary {
        Boundary::Sentence => text.split_sentence_bounds().collect(),
        Boundary::Marker(marker) => {
            let mut pieces = Vec::new();
            let mut start = 0;
            for (pos, _) in text.match_indices(marker) {
                if pos > start {
                    pieces.push(&text[start..pos]);
                }
                start = pos;
            }
            if start < text.len() {
                pieces.push(&text[start..]);
            }
            pieces
        }
    }
}
