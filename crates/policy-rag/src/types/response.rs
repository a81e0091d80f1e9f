//! Retrieval and answer types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::document::{Chunk, ChunkMetadata};

/// One retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk (embedding stripped)
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub score: f32,
}

impl ScoredChunk {
    /// Chunk text
    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    /// Chunk metadata
    pub fn metadata(&self) -> &ChunkMetadata {
        &self.chunk.metadata
    }

    /// Citation key of the chunk's document
    pub fn source_name(&self) -> &str {
        self.chunk.source_name()
    }
}

/// Answer to a question together with the evidence it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Model output, verbatim
    pub answer_text: String,
    /// Source names of the context chunks, in retrieval order
    pub citations: Vec<String>,
    /// Context chunk texts, aligned with `citations`
    pub evidence_texts: Vec<String>,
}

impl AnswerResponse {
    /// Build from the answer text and the chunks used as context
    pub fn from_evidence(answer_text: String, evidence: &[ScoredChunk]) -> Self {
        Self {
            answer_text,
            citations: evidence.iter().map(|c| c.source_name().to_string()).collect(),
            evidence_texts: evidence.iter().map(|c| c.text().to_string()).collect(),
        }
    }

    /// Citations with duplicates removed, first occurrence wins
    pub fn unique_citations(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for citation in &self.citations {
            if !seen.contains(&citation.as_str()) {
                seen.push(citation.as_str());
            }
        }
        seen
    }

    /// Citations whose source name appears in the answer text.
    ///
    /// `citations` lists everything that was retrieved; this is the narrower
    /// set the model actually referred to.
    pub fn mentioned_citations(&self) -> Vec<&str> {
        let answer = self.answer_text.to_lowercase();
        self.unique_citations()
            .into_iter()
            .filter(|name| answer.contains(&name.to_lowercase()))
            .collect()
    }

    /// Plain-text rendering for download/export
    pub fn to_export_text(&self, question: &str) -> String {
        format!(
            "Question: {}\n\nAnswer:\n{}\n\nSources: {}",
            question,
            self.answer_text,
            self.citations.join(", ")
        )
    }
}

/// Outcome of a rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Documents ingested
    pub documents: usize,
    /// Chunks embedded and indexed
    pub chunks: usize,
    /// Location of the persisted collection
    pub index_dir: PathBuf,
    /// Wall time of the rebuild
    pub elapsed_ms: u64,
}

/// Summary of the currently published index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed chunks
    pub chunks: usize,
    /// Vector dimensions
    pub dimensions: usize,
    /// Embedding model the index was built with
    pub embedding_model: String,
    /// Build timestamp
    pub built_at: chrono::DateTime<chrono::Utc>,
}
