//! Query-time access to a built index

use std::sync::Arc;

use super::index::EmbeddingIndex;
use crate::error::Result;
use crate::types::ScoredChunk;

/// Retrieves the chunks most relevant to a question.
///
/// Holds a snapshot of the index; it never builds one.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
}

impl Retriever {
    /// Retriever over `index`
    pub fn new(index: Arc<EmbeddingIndex>) -> Self {
        Self { index }
    }

    /// Top `k` chunks for `query`, best first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let results = self.index.search(query, k).await?;
        tracing::debug!(
            "Retrieved {} chunks for query ({} chars), best score {:?}",
            results.len(),
            query.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }

    /// The index being searched
    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }
}
