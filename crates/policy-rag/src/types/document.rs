//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// PDF document
    Pdf,
}

impl FileType {
    /// Extensions accepted by the loader
    pub const SUPPORTED_EXTENSIONS: [&'static str; 3] = ["txt", "md", "pdf"];

    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
        }
    }
}

/// Metadata carried from a source file into every chunk derived from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// File name, used as the citation key
    pub source_name: String,
    /// Path relative to the declared documents root, `/`-separated
    pub relative_path: String,
    /// File type
    pub file_type: FileType,
    /// Number of pages (PDF only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// A document loaded from one input file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Stable ID derived from the relative path
    pub id: String,
    /// Extracted text
    pub raw_text: String,
    /// Source metadata
    pub metadata: DocumentMetadata,
}

impl SourceDocument {
    /// Create a document; the ID is a hash of the relative path so
    /// re-ingesting the same tree yields the same IDs.
    pub fn new(raw_text: String, metadata: DocumentMetadata) -> Self {
        Self {
            id: document_id(&metadata.relative_path),
            raw_text,
            metadata,
        }
    }

    /// Citation key
    pub fn source_name(&self) -> &str {
        &self.metadata.source_name
    }
}

fn document_id(relative_path: &str) -> String {
    let digest = Sha256::digest(relative_path.as_bytes());
    hex::encode(&digest[..8])
}

/// Metadata of a chunk: the parent's source info plus its position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// File name of the parent document
    pub source_name: String,
    /// Relative path of the parent document
    pub relative_path: String,
    /// Parent document ID
    pub document_id: String,
    /// Position within the parent document
    pub chunk_index: u32,
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Text content
    pub text: String,
    /// Source information for citations
    pub metadata: ChunkMetadata,
    /// Embedding vector, assigned at index time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk of `doc` at position `chunk_index`
    pub fn new(doc: &SourceDocument, text: String, chunk_index: u32) -> Self {
        Self {
            text,
            metadata: ChunkMetadata {
                source_name: doc.metadata.source_name.clone(),
                relative_path: doc.metadata.relative_path.clone(),
                document_id: doc.id.clone(),
                chunk_index,
            },
            embedding: Vec::new(),
        }
    }

    /// Citation key
    pub fn source_name(&self) -> &str {
        &self.metadata.source_name
    }
}

/// A file present in one of the document roots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name
    pub name: String,
    /// Name of the containing folder
    pub folder: String,
    /// Full path
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(relative_path: &str) -> SourceDocument {
        SourceDocument::new(
            "text".to_string(),
            DocumentMetadata {
                source_name: "faq.md".to_string(),
                relative_path: relative_path.to_string(),
                file_type: FileType::Markdown,
                page_count: None,
            },
        )
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("md"), Some(FileType::Markdown));
        assert_eq!(FileType::from_extension("docx"), None);
        assert_eq!(FileType::from_path(Path::new("notes/a.TXT")), Some(FileType::Txt));
        assert_eq!(FileType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_document_id_is_stable() {
        assert_eq!(doc("sample_docs/faq.md").id, doc("sample_docs/faq.md").id);
        assert_ne!(doc("sample_docs/faq.md").id, doc("uploads/faq.md").id);
        assert_eq!(doc("sample_docs/faq.md").id.len(), 16);
    }

    #[test]
    fn test_chunk_inherits_source() {
        let d = doc("sample_docs/faq.md");
        let chunk = Chunk::new(&d, "part".to_string(), 3);
        assert_eq!(chunk.source_name(), "faq.md");
        assert_eq!(chunk.metadata.relative_path, "sample_docs/faq.md");
        assert_eq!(chunk.metadata.document_id, d.id);
        assert_eq!(chunk.metadata.chunk_index, 3);
        assert!(chunk.embedding.is_empty());
    }
}
