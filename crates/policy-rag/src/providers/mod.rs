//! Provider abstractions for embeddings and text generation
//!
//! The pipeline only talks to these traits; `OpenAiClient` is the production
//! backend and tests inject deterministic stubs.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, LlmProvider, Role};
pub use openai::OpenAiClient;
