//! Document listing and upload endpoints

use axum::{
    extract::{Multipart, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{FileDescriptor, IndexStats, RefreshReport};

/// Body returned by `GET /api/documents`
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<FileDescriptor>,
    pub total: usize,
    pub index: IndexStats,
}

/// Query parameters of `POST /api/documents`
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Rebuild the index once the files are saved
    #[serde(default)]
    pub refresh: bool,
}

/// A file that could not be saved
#[derive(Debug, Serialize)]
pub struct UploadError {
    pub filename: String,
    pub error: String,
}

/// Body returned by `POST /api/documents`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub saved: Vec<String>,
    pub errors: Vec<UploadError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshReport>,
}

/// GET /api/documents - List files in the document roots
pub async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DocumentListResponse>> {
    state.require_user(&headers)?;
    let documents = state.pipeline().library().list_existing_documents()?;
    Ok(Json(DocumentListResponse {
        total: documents.len(),
        documents,
        index: state.pipeline().index_stats(),
    }))
}

/// POST /api/documents - Save uploaded files into the uploads root
pub async fn upload_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    state.require_admin(&headers)?;

    let library = state.pipeline().library();
    let mut saved = Vec::new();
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                errors.push(UploadError {
                    filename,
                    error: format!("Failed to read file: {}", e),
                });
                continue;
            }
        };

        match library.save_upload(&filename, &data).await {
            Ok(path) => saved.push(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or(filename),
            ),
            Err(e) => errors.push(UploadError {
                filename,
                error: e.to_string(),
            }),
        }
    }

    let refresh = if params.refresh && !saved.is_empty() {
        Some(state.pipeline().refresh().await?)
    } else {
        None
    };

    tracing::info!("Upload: {} saved, {} rejected", saved.len(), errors.len());
    Ok(Json(UploadResponse {
        saved,
        errors,
        refresh,
    }))
}
