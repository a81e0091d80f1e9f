//! Configuration for the policy RAG system
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Environment variable holding the embedding/generation API key
pub const API_KEY_ENV: &str = "EMBEDDING_API_KEY";

/// Fixed collection identifier the index is namespaced by
pub const COLLECTION_NAME: &str = "policy_rag_docs";

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Document roots
    pub documents: DocumentsConfig,
    /// Index storage
    pub index: IndexConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Language model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Shared secrets for the HTTP surface
    pub security: SecurityConfig,
}

/// Where documents are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Declared documents root; citation paths are relative to it
    pub data_dir: PathBuf,
    /// Directories scanned for documents. The last one receives uploads.
    pub roots: Vec<PathBuf>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            roots: Self::default_roots(&data_dir),
            data_dir,
        }
    }
}

impl DocumentsConfig {
    /// `sample_docs` and `uploads` under `data_dir`
    pub fn default_roots(data_dir: &Path) -> Vec<PathBuf> {
        vec![data_dir.join("sample_docs"), data_dir.join("uploads")]
    }

    /// Move the data directory, carrying the roots along while they are
    /// still the defaults of the previous one
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        if self.roots == Self::default_roots(&self.data_dir) {
            self.roots = Self::default_roots(&data_dir);
        }
        self.data_dir = data_dir;
    }

    /// Directory that receives uploaded files
    pub fn uploads_dir(&self) -> PathBuf {
        self.roots
            .last()
            .cloned()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Storage location holding the collection directory
    pub storage_dir: PathBuf,
    /// Collection identifier
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("vector_db"),
            collection: COLLECTION_NAME.to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Language model configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key, shared by embeddings and generation
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            generate_model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (1536 for text-embedding-3-small)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 64,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 20MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_size: 20 * 1024 * 1024,
        }
    }
}

/// Secrets gating the HTTP surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Admin secret for refresh and uploads
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
    /// User-tier secret; when unset the query endpoints are open
    #[serde(skip_serializing)]
    pub app_password: Option<String>,
}

impl RagConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then an optional TOML file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("RAG_API_BASE_URL") {
            self.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = get("RAG_DATA_DIR") {
            self.documents.set_data_dir(PathBuf::from(dir));
        }
        if let Some(roots) = get("RAG_DOCUMENT_ROOTS") {
            self.documents.roots = std::env::split_paths(&roots).collect();
        }
        if let Some(dir) = get("RAG_INDEX_DIR") {
            self.index.storage_dir = PathBuf::from(dir);
        }
        if let Some(v) = get("RAG_CHUNK_SIZE") {
            self.chunking.chunk_size = parse_var("RAG_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("RAG_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_var("RAG_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("RAG_TOP_K") {
            self.retrieval.top_k = parse_var("RAG_TOP_K", &v)?;
        }
        if let Some(model) = get("RAG_EMBEDDING_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(v) = get("RAG_EMBEDDING_DIMENSIONS") {
            self.embeddings.dimensions = parse_var("RAG_EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(model) = get("RAG_GENERATION_MODEL") {
            self.llm.generate_model = model;
        }
        if let Some(v) = get("RAG_TEMPERATURE") {
            self.llm.temperature = parse_var("RAG_TEMPERATURE", &v)?;
        }
        if let Some(secret) = get("RAG_ADMIN_PASSWORD") {
            self.security.admin_password = Some(secret);
        }
        if let Some(secret) = get("RAG_APP_PASSWORD") {
            self.security.app_password = Some(secret);
        }
        if let Some(host) = get("RAG_HOST") {
            self.server.host = host;
        }
        if let Some(v) = get("RAG_PORT") {
            self.server.port = parse_var("RAG_PORT", &v)?;
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embedding batch_size must be at least 1".to_string()));
        }
        if self.documents.roots.is_empty() {
            return Err(Error::Config("at least one document root is required".to_string()));
        }
        Ok(())
    }

    /// API key, or `MissingConfiguration` naming the variable to set
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::MissingConfiguration(API_KEY_ENV.to_string()))
    }

    /// Directory holding the persisted collection
    pub fn collection_dir(&self) -> PathBuf {
        self.index.storage_dir.join(&self.index.collection)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{} has an invalid value '{}': {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 4);
        assert!((config.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.documents.roots.len(), 2);
        assert_eq!(config.documents.uploads_dir(), PathBuf::from("data/uploads"));
        assert_eq!(config.collection_dir(), PathBuf::from("vector_db/policy_rag_docs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let config = RagConfig::default();
        match config.require_api_key() {
            Err(Error::MissingConfiguration(name)) => assert_eq!(name, API_KEY_ENV),
            other => panic!("expected MissingConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config
            .apply_env_with(lookup(&[
                ("EMBEDDING_API_KEY", "sk-test"),
                ("RAG_CHUNK_SIZE", "500"),
                ("RAG_CHUNK_OVERLAP", "50"),
                ("RAG_TOP_K", "6"),
                ("RAG_API_BASE_URL", "http://localhost:8000/v1/"),
                ("RAG_TEMPERATURE", "0.0"),
            ]))
            .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.llm.base_url, "http://localhost:8000/v1");
        assert_eq!(config.llm.temperature, 0.0);
    }

    #[test]
    fn test_data_dir_carries_default_roots() {
        let mut config = RagConfig::default();
        config
            .apply_env_with(lookup(&[("RAG_DATA_DIR", "/srv/policy")]))
            .unwrap();
        assert_eq!(config.documents.data_dir, PathBuf::from("/srv/policy"));
        assert_eq!(
            config.documents.roots,
            vec![PathBuf::from("/srv/policy/sample_docs"), PathBuf::from("/srv/policy/uploads")]
        );
        assert_eq!(config.documents.uploads_dir(), PathBuf::from("/srv/policy/uploads"));

        let mut explicit = RagConfig::default();
        explicit
            .apply_env_with(lookup(&[
                ("RAG_DATA_DIR", "/srv/policy"),
                ("RAG_DOCUMENT_ROOTS", "/mnt/faqs"),
            ]))
            .unwrap();
        assert_eq!(explicit.documents.roots, vec![PathBuf::from("/mnt/faqs")]);

        let mut custom = RagConfig::default();
        custom.documents.roots = vec![PathBuf::from("corpus")];
        custom
            .apply_env_with(lookup(&[("RAG_DATA_DIR", "/srv/policy")]))
            .unwrap();
        assert_eq!(custom.documents.roots, vec![PathBuf::from("corpus")]);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut config = RagConfig::default();
        config
            .apply_env_with(lookup(&[("EMBEDDING_API_KEY", "   ")]))
            .unwrap();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut config = RagConfig::default();
        let err = config
            .apply_env_with(lookup(&[("RAG_TOP_K", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("RAG_TOP_K"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 800;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(
            &path,
            r#"
[chunking]
chunk_size = 400
chunk_overlap = 40

[llm]
generate_model = "gpt-4o"
"#,
        )
        .unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.llm.generate_model, "gpt-4o");
        // untouched sections keep their defaults
        assert_eq!(config.retrieval.top_k, 4);
    }
}
