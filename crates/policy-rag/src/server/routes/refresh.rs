//! Index rebuild endpoint

use axum::{extract::State, http::HeaderMap, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::RefreshReport;

/// POST /api/refresh - Rebuild the index from the documents on disk
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshReport>> {
    state.require_admin(&headers)?;
    tracing::info!("Index refresh requested");
    let report = state.pipeline().refresh().await?;
    Ok(Json(report))
}
