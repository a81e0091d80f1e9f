//! Deterministic providers and corpus helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use policy_rag::providers::{ChatMessage, EmbeddingProvider, LlmProvider};
use policy_rag::{RagConfig, Result};

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: every lowercase word is hashed onto one axis
#[derive(Default)]
pub struct HashEmbedder {
    pub texts_embedded: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

fn axis(word: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMENSIONS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.texts_embedded.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[axis(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "hash-bow"
    }
}

/// Chat model that cites the first source block it was given
#[derive(Default)]
pub struct CountingLlm {
    pub calls: AtomicUsize,
}

impl CountingLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for CountingLlm {
    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let first_source = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Source: "))
            .unwrap_or("unknown");
        Ok(format!("Supported by the context ({}).", first_source))
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "counting-model"
    }
}

/// Configuration rooted in `dir` with the sample and upload roots
pub fn config_in(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    let data_dir = dir.join("data");
    config.documents.roots = vec![data_dir.join("sample_docs"), data_dir.join("uploads")];
    config.documents.data_dir = data_dir;
    config.index.storage_dir = dir.join("vector_db");
    config.embeddings.dimensions = DIMENSIONS;
    config.embeddings.batch_size = 2;
    config.security.admin_password = Some("admin-secret".to_string());
    config
}

/// Write a sample document into the first root
pub fn write_sample(config: &RagConfig, name: &str, text: &str) {
    let root = &config.documents.roots[0];
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join(name), text).unwrap();
}

/// The two-FAQ retirement corpus
pub fn write_faq_corpus(config: &RagConfig) {
    write_sample(
        config,
        "faq1.md",
        "## Withdrawals\nCPF members can withdraw their savings from age 55.",
    );
    write_sample(
        config,
        "faq2.md",
        "## Payouts\nCPF LIFE monthly payouts start from the payout eligibility age of 65.",
    );
}
