//! API routes for the RAG server

pub mod documents;
pub mod query;
pub mod refresh;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query))
        .route("/summarize", post(query::summarize))
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/refresh", post(refresh::refresh))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    Json(json!({
        "name": "policy-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Grounded, cited answers to policy questions from a document corpus",
        "index": state.pipeline().index_stats(),
        "models": {
            "embedding": config.embeddings.model,
            "generation": config.llm.generate_model,
        },
        "endpoints": {
            "POST /api/query": "Answer a question with citations",
            "POST /api/summarize": "Summarize the documents relevant to a question",
            "GET /api/documents": "List documents in the document roots",
            "POST /api/documents": "Upload documents (admin)",
            "POST /api/refresh": "Rebuild the index from disk (admin)"
        }
    }))
}
