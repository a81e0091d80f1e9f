//! OpenAI-compatible client for embeddings and chat completions
//!
//! Failures are reported once and never retried: transport and status errors
//! become `EmbeddingBackendUnavailable` or `GenerationBackendUnavailable`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatMessage, LlmProvider};

/// Client for an OpenAI-compatible API, shared by embeddings and generation
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generate_model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a client from configuration. Fails with `MissingConfiguration`
    /// when no API key is set.
    pub fn new(config: &RagConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: config.embeddings.model.clone(),
            generate_model: config.llm.generate_model.clone(),
            dimensions: config.embeddings.dimensions,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and decode a JSON reply, mapping failures with `fail`
    async fn post_json<B, R>(&self, path: &str, body: &B, fail: fn(String) -> Error) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| fail(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(fail(format!("{} returned {}: {}", url, status, detail)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| fail(format!("malformed response from {}: {}", url, e)))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Embedding batch of {} with {}",
            texts.len(),
            self.embedding_model
        );

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self
            .post_json("embeddings", &request, Error::EmbeddingBackendUnavailable)
            .await?;

        if response.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        tracing::debug!(
            "Chat completion with {} ({} messages)",
            self.generate_model,
            messages.len()
        );

        let request = ChatRequest {
            model: &self.generate_model,
            messages,
            temperature,
        };
        let response: ChatResponse = self
            .post_json("chat/completions", &request, Error::GenerationBackendUnavailable)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::generation("API returned no completion"))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}
