//! Document ingestion: discovery, parsing and chunking

mod chunker;
mod loader;
mod parser;

pub use chunker::TextChunker;
pub use loader::{DocumentLibrary, DocumentLoader};
pub use parser::{FileParser, ParsedDocument};
