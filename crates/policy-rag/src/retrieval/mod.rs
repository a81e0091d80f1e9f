//! Vector index and retrieval

mod index;
mod retriever;

pub use index::{EmbeddingIndex, IndexStorage};
pub use retriever::Retriever;
