//! Persistent embedding index with cosine-similarity search
//!
//! One collection lives in `<root>/<collection>/index.json`. A rebuild writes
//! the new index into a staging directory and swaps it into place, so a
//! failed rebuild never touches the previous index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, IndexStats, ScoredChunk};

const INDEX_FILE: &str = "index.json";

/// Location of a persisted collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStorage {
    root: PathBuf,
    collection: String,
}

impl IndexStorage {
    /// Storage for `collection` under `root`
    pub fn new(root: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            collection: collection.into(),
        }
    }

    /// Storage described by the index configuration
    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(config.storage_dir.clone(), config.collection.clone())
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collection identifier
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Live collection directory
    pub fn collection_dir(&self) -> PathBuf {
        self.root.join(&self.collection)
    }

    /// Index file inside the live collection directory
    pub fn index_file(&self) -> PathBuf {
        self.collection_dir().join(INDEX_FILE)
    }

    fn sibling(&self, kind: &str) -> PathBuf {
        self.root
            .join(format!(".{}.{}-{}", self.collection, kind, Uuid::new_v4().simple()))
    }
}

/// On-disk form of an index
#[derive(Serialize, Deserialize)]
struct IndexManifest {
    collection: String,
    embedding_model: String,
    dimensions: usize,
    built_at: DateTime<Utc>,
    entries: Vec<Chunk>,
}

/// Embedded chunks plus the provider used to embed queries against them
pub struct EmbeddingIndex {
    storage: IndexStorage,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_model: String,
    dimensions: usize,
    built_at: DateTime<Utc>,
    entries: Vec<Chunk>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("storage", &self.storage)
            .field("embedding_model", &self.embedding_model)
            .field("dimensions", &self.dimensions)
            .field("built_at", &self.built_at)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Embed `chunks` in batches of `batch_size`, persist the result, and
    /// replace whatever index `storage` held before.
    ///
    /// Fails with `EmptyCorpus` before touching disk when there is nothing
    /// to index.
    pub async fn rebuild(
        storage: IndexStorage,
        mut chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let dimensions = embedder.dimensions();
        let batch_size = batch_size.max(1);

        tracing::info!(
            "Embedding {} chunks with {} (batches of {})",
            chunks.len(),
            embedder.name(),
            batch_size
        );

        for batch in chunks.chunks_mut(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "requested {} embeddings, received {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (chunk, vector) in batch.iter_mut().zip(vectors) {
                check_dimensions(&vector, dimensions)?;
                chunk.embedding = vector;
            }
        }

        let index = Self {
            embedding_model: embedder.name().to_string(),
            storage,
            embedder,
            dimensions,
            built_at: Utc::now(),
            entries: chunks,
        };
        index.persist().await?;

        tracing::info!(
            "Index rebuilt: {} chunks at {}",
            index.entries.len(),
            index.storage.collection_dir().display()
        );
        Ok(index)
    }

    /// Load the persisted index.
    ///
    /// Returns `None` when no index exists, or when it was built with a
    /// different embedding model or dimension and must be rebuilt.
    pub async fn load(
        storage: IndexStorage,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Option<Self>> {
        let path = storage.index_file();
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No index found at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let manifest: IndexManifest = serde_json::from_slice(&raw)
            .map_err(|e| Error::index(format!("corrupt index {}: {}", path.display(), e)))?;

        if manifest.embedding_model != embedder.name()
            || manifest.dimensions != embedder.dimensions()
        {
            tracing::warn!(
                "Index at {} was built with {} ({} dims), current embedder is {} ({} dims)",
                path.display(),
                manifest.embedding_model,
                manifest.dimensions,
                embedder.name(),
                embedder.dimensions()
            );
            return Ok(None);
        }

        if let Some(bad) = manifest
            .entries
            .iter()
            .find(|c| c.embedding.len() != manifest.dimensions)
        {
            return Err(Error::index(format!(
                "entry {}#{} has {} dimensions, expected {}",
                bad.metadata.relative_path,
                bad.metadata.chunk_index,
                bad.embedding.len(),
                manifest.dimensions
            )));
        }

        tracing::info!(
            "Loaded index with {} chunks from {}",
            manifest.entries.len(),
            path.display()
        );

        Ok(Some(Self {
            storage,
            embedder,
            embedding_model: manifest.embedding_model,
            dimensions: manifest.dimensions,
            built_at: manifest.built_at,
            entries: manifest.entries,
        }))
    }

    /// Top `k` chunks by cosine similarity to `query`, best first.
    ///
    /// Equal scores keep insertion order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        check_dimensions(&query_vector, self.dimensions)?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query_vector, &chunk.embedding)))
            .collect();

        // stable sort, so ties stay in insertion order; NaN ranks last
        scored.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let mut chunk = self.entries[i].clone();
                chunk.embedding = Vec::new();
                ScoredChunk { chunk, score }
            })
            .collect())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Build timestamp
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Where the index is persisted
    pub fn storage(&self) -> &IndexStorage {
        &self.storage
    }

    /// Summary for status reporting
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            chunks: self.entries.len(),
            dimensions: self.dimensions,
            embedding_model: self.embedding_model.clone(),
            built_at: self.built_at,
        }
    }

    /// Write to a staging directory, then swap it with the live one
    async fn persist(&self) -> Result<()> {
        let manifest = IndexManifest {
            collection: self.storage.collection.clone(),
            embedding_model: self.embedding_model.clone(),
            dimensions: self.dimensions,
            built_at: self.built_at,
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec(&manifest)?;

        tokio::fs::create_dir_all(self.storage.root()).await?;

        let staging = self.storage.sibling("staging");
        if let Err(e) = write_staging(&staging, &bytes).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let live = self.storage.collection_dir();
        let retired = self.storage.sibling("old");
        let had_live = tokio::fs::try_exists(&live).await?;

        if had_live {
            if let Err(e) = tokio::fs::rename(&live, &retired).await {
                let _ = tokio::fs::remove_dir_all(&staging).await;
                return Err(e.into());
            }
        }

        if let Err(e) = tokio::fs::rename(&staging, &live).await {
            if had_live {
                let _ = tokio::fs::rename(&retired, &live).await;
            }
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e.into());
        }

        if had_live {
            if let Err(e) = tokio::fs::remove_dir_all(&retired).await {
                tracing::warn!("Could not remove old index {}: {}", retired.display(), e);
            }
        }

        Ok(())
    }
}

async fn write_staging(dir: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(INDEX_FILE), bytes).await?;
    Ok(())
}

fn check_dimensions(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::embedding(format!(
            "embedding has {} dimensions, expected {}",
            vector.len(),
            expected
        )));
    }
    Ok(())
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
