//! Discovery and loading of source documents from the configured roots

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::parser::FileParser;
use crate::config::DocumentsConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentMetadata, FileDescriptor, FileType, SourceDocument};

/// Walks document roots and yields one `SourceDocument` per supported file
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    data_dir: PathBuf,
    roots: Vec<PathBuf>,
}

impl DocumentLoader {
    /// Create a loader. Relative paths are computed against `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, roots: Vec<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            roots,
        }
    }

    /// Create a loader for the configured roots
    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(config.data_dir.clone(), config.roots.clone())
    }

    /// Lazily load every supported file under every root.
    ///
    /// Files are visited in file-name order. Missing roots, unreadable
    /// entries and files that fail to parse are logged and skipped.
    pub fn load_documents(&self) -> impl Iterator<Item = SourceDocument> + '_ {
        self.roots.iter().flat_map(move |root| self.walk_root(root))
    }

    fn walk_root<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = SourceDocument> + 'a {
        WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| FileType::from_path(entry.path()).is_some())
            .filter_map(move |entry| match self.load_from_root(entry.path(), Some(root)) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    None
                }
            })
    }

    /// Load a single file. Unsupported extensions fail with `UnsupportedFormat`.
    pub fn load_file(&self, path: &Path) -> Result<SourceDocument> {
        self.load_from_root(path, None)
    }

    fn load_from_root(&self, path: &Path, root: Option<&Path>) -> Result<SourceDocument> {
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if FileType::from_path(path).is_none() {
            return Err(Error::UnsupportedFormat(source_name));
        }

        let data = std::fs::read(path)?;
        let parsed = FileParser::parse(&source_name, &data)?;

        tracing::debug!(
            "Loaded {} ({}, {} chars)",
            path.display(),
            parsed.file_type.display_name(),
            parsed.content.len()
        );

        Ok(SourceDocument::new(
            parsed.content,
            DocumentMetadata {
                relative_path: self.relative_path(path, root),
                source_name,
                file_type: parsed.file_type,
                page_count: parsed.total_pages,
            },
        ))
    }

    fn relative_path(&self, path: &Path, root: Option<&Path>) -> String {
        let relative = path
            .strip_prefix(&self.data_dir)
            .ok()
            .or_else(|| root.and_then(|r| path.strip_prefix(r).ok()))
            .unwrap_or(path);

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// File-level view of the document roots: listing, layout and uploads
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    documents: DocumentsConfig,
    index_dir: PathBuf,
}

impl DocumentLibrary {
    /// Create a library over the configured roots and index location
    pub fn new(documents: DocumentsConfig, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents,
            index_dir: index_dir.into(),
        }
    }

    /// Loader over the same roots
    pub fn loader(&self) -> DocumentLoader {
        DocumentLoader::from_config(&self.documents)
    }

    /// Directory that receives uploads
    pub fn uploads_dir(&self) -> PathBuf {
        self.documents.uploads_dir()
    }

    /// Create every document root and the index directory
    pub fn ensure_storage_layout(&self) -> Result<()> {
        for root in &self.documents.roots {
            std::fs::create_dir_all(root)?;
        }
        std::fs::create_dir_all(&self.index_dir)?;
        Ok(())
    }

    /// Top-level files of each root, sorted by name within each root
    pub fn list_existing_documents(&self) -> Result<Vec<FileDescriptor>> {
        let mut files = Vec::new();

        for root in &self.documents.roots {
            let entries = match std::fs::read_dir(root) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!("Cannot list {}: {}", root.display(), e);
                    continue;
                }
            };

            let folder = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string());

            let mut in_root = Vec::new();
            for entry in entries {
                let entry = entry?;
                let metadata = entry.metadata()?;
                if !metadata.is_file() {
                    continue;
                }
                in_root.push(FileDescriptor {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    folder: folder.clone(),
                    path: entry.path(),
                    size_bytes: metadata.len(),
                });
            }

            in_root.sort_by(|a, b| a.name.cmp(&b.name));
            files.extend(in_root);
        }

        Ok(files)
    }

    /// Write an uploaded file into the uploads root and return its path.
    ///
    /// Only the final component of `file_name` is kept.
    pub async fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = file_name
            .rsplit(['/', '\\'])
            .next()
            .map(str::trim)
            .unwrap_or("");

        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::UnsupportedFormat(format!(
                "invalid upload name '{}'",
                file_name
            )));
        }
        if FileType::from_path(Path::new(name)).is_none() {
            return Err(Error::UnsupportedFormat(format!(
                "{} (supported: {})",
                name,
                FileType::SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let dir = self.uploads_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!("Saved upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
