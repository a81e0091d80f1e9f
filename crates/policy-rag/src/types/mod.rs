//! Core types for the RAG system

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkMetadata, DocumentMetadata, FileDescriptor, FileType, SourceDocument};
pub use response::{AnswerResponse, IndexStats, RefreshReport, ScoredChunk};
