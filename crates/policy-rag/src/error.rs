//! Error types for the policy RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to end users when retrieval produced no evidence.
pub const CANNOT_CONFIRM_MESSAGE: &str = "I cannot confirm this from the indexed documents. \
Please consult the official, authoritative sources for this policy.";

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// File type outside the supported allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Rebuild attempted with nothing to index
    #[error("No documents found to index. Add files to the document directories first.")]
    EmptyCorpus,

    /// Retrieval returned nothing to ground an answer on
    #[error("No evidence was retrieved for this question")]
    NoEvidence,

    /// Embedding backend failed (network, auth, malformed response)
    #[error("Embedding backend unavailable: {0}")]
    EmbeddingBackendUnavailable(String),

    /// Generation backend failed (network, auth, malformed response)
    #[error("Generation backend unavailable: {0}")]
    GenerationBackendUnavailable(String),

    /// A required setting is absent
    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(String),

    /// A setting is present but invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Persisted index is unreadable or inconsistent
    #[error("Index error: {0}")]
    Index(String),

    /// Malformed request from an HTTP client
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credential check failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding backend error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingBackendUnavailable(message.into())
    }

    /// Create a generation backend error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationBackendUnavailable(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::UnsupportedFormat(ext) => (
                StatusCode::BAD_REQUEST,
                "unsupported_format",
                format!("Unsupported file type: {}", ext),
            ),
            Error::EmptyCorpus => (
                StatusCode::SERVICE_UNAVAILABLE,
                "empty_corpus",
                self.to_string(),
            ),
            Error::NoEvidence => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_evidence",
                CANNOT_CONFIRM_MESSAGE.to_string(),
            ),
            Error::EmbeddingBackendUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "embedding_unavailable", msg.clone())
            }
            Error::GenerationBackendUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "generation_unavailable", msg.clone())
            }
            Error::MissingConfiguration(_) | Error::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                self.to_string(),
            ),
            Error::FileParse { filename, message } => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("Failed to parse '{}': {}", filename, message),
            ),
            Error::Index(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "index_error", msg.clone()),
            Error::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
