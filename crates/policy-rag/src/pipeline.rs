//! Pipeline orchestration: ingestion, index lifecycle and question answering

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerGenerator;
use crate::ingestion::{DocumentLibrary, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider, OpenAiClient};
use crate::retrieval::{EmbeddingIndex, IndexStorage, Retriever};
use crate::types::{AnswerResponse, IndexStats, RefreshReport, ScoredChunk};

/// Owns the published index and answers questions against it.
///
/// Queries take a snapshot of the current index and never block on a
/// rebuild; rebuilds are serialized and publish only on success.
pub struct RagPipeline {
    config: RagConfig,
    library: DocumentLibrary,
    chunker: TextChunker,
    storage: IndexStorage,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: AnswerGenerator,
    index: RwLock<Arc<EmbeddingIndex>>,
    rebuild_lock: Mutex<()>,
}

impl RagPipeline {
    /// Build a pipeline over OpenAI-compatible providers described by `config`
    pub async fn from_config(config: RagConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(&config)?);
        Self::new(config, client.clone(), client).await
    }

    /// Build a pipeline, loading the persisted index or building one from
    /// the document roots when none exists.
    pub async fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let library = DocumentLibrary::new(config.documents.clone(), config.index.storage_dir.clone());
        library.ensure_storage_layout()?;

        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        let storage = IndexStorage::from_config(&config.index);

        let index = match EmbeddingIndex::load(storage.clone(), embedder.clone()).await? {
            Some(index) => index,
            None => {
                tracing::info!("Building index from {} document roots", config.documents.roots.len());
                let (index, _) =
                    build_index(&library, &chunker, &storage, &embedder, config.embeddings.batch_size)
                        .await?;
                index
            }
        };

        tracing::info!(
            "Pipeline ready: {} chunks, embeddings {}, generation {}",
            index.len(),
            embedder.name(),
            llm.model()
        );

        Ok(Self {
            generator: AnswerGenerator::new(llm, config.llm.temperature),
            config,
            library,
            chunker,
            storage,
            embedder,
            index: RwLock::new(Arc::new(index)),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Build and persist a fresh index from `config` without starting a
    /// pipeline. Any existing index is replaced, never loaded.
    pub async fn rebuild(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<RefreshReport> {
        config.validate()?;
        let started = Instant::now();

        let library = DocumentLibrary::new(config.documents.clone(), config.index.storage_dir.clone());
        library.ensure_storage_layout()?;
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        let storage = IndexStorage::from_config(&config.index);

        let (index, documents) =
            build_index(&library, &chunker, &storage, &embedder, config.embeddings.batch_size).await?;

        Ok(RefreshReport {
            documents,
            chunks: index.len(),
            index_dir: storage.collection_dir(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Rebuild the index from the documents currently on disk.
    ///
    /// The published index is replaced only when the rebuild succeeds.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let _guard = self.rebuild_lock.lock().await;
        let started = Instant::now();

        let (index, documents) = build_index(
            &self.library,
            &self.chunker,
            &self.storage,
            &self.embedder,
            self.config.embeddings.batch_size,
        )
        .await?;

        let report = RefreshReport {
            documents,
            chunks: index.len(),
            index_dir: self.storage.collection_dir(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        *self.index.write() = Arc::new(index);

        tracing::info!(
            "Refreshed index: {} documents, {} chunks in {}ms",
            report.documents,
            report.chunks,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Answer `question` from the top `k` chunks
    pub async fn query(&self, question: &str, k: usize) -> Result<AnswerResponse> {
        let evidence = self.retrieve(question, k).await?;
        self.generator.generate(question, &evidence).await
    }

    /// Summarize the top `k` chunks for `question`
    pub async fn summarize(&self, question: &str, k: usize) -> Result<String> {
        let evidence = self.retrieve(question, k).await?;
        self.generator.summarize(question, &evidence).await
    }

    /// Retrieve the top `k` chunks without generating
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.retriever().retrieve(question, k).await
    }

    /// Retriever over the currently published index
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.index.read().clone())
    }

    /// Summary of the currently published index
    pub fn index_stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    /// Document roots
    pub fn library(&self) -> &DocumentLibrary {
        &self.library
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

/// Load, chunk and embed every document; returns the index and document count
async fn build_index(
    library: &DocumentLibrary,
    chunker: &TextChunker,
    storage: &IndexStorage,
    embedder: &Arc<dyn EmbeddingProvider>,
    batch_size: usize,
) -> Result<(EmbeddingIndex, usize)> {
    let loader = library.loader();
    let documents = tokio::task::spawn_blocking(move || loader.load_documents().collect::<Vec<_>>())
        .await
        .map_err(|e| Error::internal(format!("document loading task failed: {}", e)))?;

    let chunks = chunker.chunk_documents(&documents);
    tracing::info!("Loaded {} documents into {} chunks", documents.len(), chunks.len());

    let index = EmbeddingIndex::rebuild(storage.clone(), chunks, embedder.clone(), batch_size).await?;
    Ok((index, documents.len()))
}
