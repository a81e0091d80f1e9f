//! Question answering and summarization endpoints

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Error, Result, CANNOT_CONFIRM_MESSAGE};
use crate::server::state::AppState;

/// Body of `POST /api/query`
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question
    pub question: String,
    /// Number of chunks to retrieve (defaults to the configured top_k)
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Also return a summary of the retrieved context
    #[serde(default)]
    pub summarize: bool,
}

/// One piece of evidence behind an answer
#[derive(Debug, Serialize)]
pub struct Evidence {
    pub source: String,
    pub text: String,
}

/// Body returned by `POST /api/query`
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// Answer text, or the cannot-confirm message when nothing was retrieved
    pub answer: String,
    /// Source names of the retrieved chunks, in retrieval order
    pub citations: Vec<String>,
    /// Citations the answer text actually names
    pub mentioned_citations: Vec<String>,
    /// Retrieved chunk texts with their sources
    pub evidence: Vec<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// False when no evidence was found
    pub grounded: bool,
    /// Plain-text export of the question, answer and sources
    pub export_text: String,
    pub processing_time_ms: u64,
}

/// Body of `POST /api/summarize`
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub question: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Body returned by `POST /api/summarize`
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidRequest("question must not be empty".to_string()));
    }
    Ok(question)
}

/// POST /api/query - Answer a question with citations
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    state.require_user(&headers)?;
    let start = Instant::now();
    let question = validate_question(&request.question)?;
    let top_k = request.top_k.unwrap_or(state.config().retrieval.top_k);

    tracing::info!("Query: \"{}\" (top_k {})", question, top_k);

    let pipeline = state.pipeline();
    let answer = match pipeline.query(question, top_k).await {
        Ok(answer) => answer,
        Err(Error::NoEvidence) => {
            tracing::info!("No evidence retrieved for \"{}\"", question);
            return Ok(Json(QueryResponse {
                answer: CANNOT_CONFIRM_MESSAGE.to_string(),
                citations: Vec::new(),
                mentioned_citations: Vec::new(),
                evidence: Vec::new(),
                summary: None,
                grounded: false,
                export_text: format!(
                    "Question: {}\n\nAnswer:\n{}\n\nSources: ",
                    question, CANNOT_CONFIRM_MESSAGE
                ),
                processing_time_ms: start.elapsed().as_millis() as u64,
            }));
        }
        Err(e) => return Err(e),
    };

    let summary = if request.summarize {
        Some(pipeline.summarize(question, top_k).await?)
    } else {
        None
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Query completed in {}ms, {} citations",
        processing_time_ms,
        answer.citations.len()
    );

    Ok(Json(QueryResponse {
        mentioned_citations: answer
            .mentioned_citations()
            .into_iter()
            .map(str::to_string)
            .collect(),
        export_text: answer.to_export_text(question),
        evidence: answer
            .citations
            .iter()
            .zip(&answer.evidence_texts)
            .map(|(source, text)| Evidence {
                source: source.clone(),
                text: text.clone(),
            })
            .collect(),
        citations: answer.citations,
        answer: answer.answer_text,
        summary,
        grounded: true,
        processing_time_ms,
    }))
}

/// POST /api/summarize - Summarize the documents relevant to a question
pub async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    state.require_user(&headers)?;
    let question = validate_question(&request.question)?;
    let top_k = request.top_k.unwrap_or(state.config().retrieval.top_k);

    let summary = state.pipeline().summarize(question, top_k).await?;
    Ok(Json(SummarizeResponse { summary }))
}
