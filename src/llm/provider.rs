//! LLM provider abstraction and trait definitions
//!
//! This module defines the core traits and types for provider interactions.
//! Chat completion and image synthesis are separate capabilities so that a
//! conversational-only provider and a multi-model provider can sit behind the
//! same dispatcher.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Message roles in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Completion request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Build the system-instruction plus user-utterance pair used for every
    /// single-turn request.
    pub fn single_turn(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        utterance: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(utterance)],
            model: model.into(),
            temperature: Some(temperature),
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why completion finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Image synthesis request.
///
/// `seed` of `-1` leaves the seed unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub inference_steps: u32,
    pub negative_prompt: String,
    pub seed: i64,
    /// Raster format the provider should encode the image as (e.g. "png")
    pub extension: String,
}

/// Image synthesis response carrying the base64 payload as delivered
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub model: String,
    pub b64_data: String,
    pub extension: String,
}

/// Chat completion capability
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "nebius")
    fn name(&self) -> &str;

    /// Generate a completion from the given request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Image synthesis capability
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate one image from the given request
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageResponse, LlmError>;
}

/// Provider family exposing both a text-completion model and an
/// image-synthesis model under one credential
pub trait MultiModelProvider: LlmProvider + ImageProvider {}

impl<T> MultiModelProvider for T where T: LlmProvider + ImageProvider {}

/// Provider errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
}
