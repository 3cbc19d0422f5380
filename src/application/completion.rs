//! Seam to the external chat-completion provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// One provider call. `app_title` identifies the calling feature to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub app_title: &'static str,
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion provider is not configured")]
    NotConfigured,
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion provider responded with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("completion response was malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Text of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
