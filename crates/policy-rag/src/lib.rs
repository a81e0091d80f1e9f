//! policy-rag: grounded question answering over a policy document corpus
//!
//! Documents (plain text, markdown, PDF) are loaded from configured roots,
//! chunked, embedded and persisted in a local index. Questions are answered
//! by a chat model from the retrieved chunks only, with the source file of
//! every chunk reported as a citation.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod security;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result, CANNOT_CONFIRM_MESSAGE};
pub use pipeline::RagPipeline;
pub use types::{
    AnswerResponse, Chunk, ChunkMetadata, DocumentMetadata, FileType, RefreshReport, ScoredChunk,
    SourceDocument,
};
