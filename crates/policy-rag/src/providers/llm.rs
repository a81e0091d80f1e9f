//! LLM provider trait for chat-style generation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// System instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for LLM-based generation
///
/// Implementations:
/// - `OpenAiClient`: any OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation and return the assistant's reply verbatim
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
