//! OpenAI-compatible provider implementation
//!
//! Both backends speak the OpenAI wire format: the conversational provider is
//! OpenAI itself, the multi-model provider is Nebius AI Studio's compatible
//! endpoint. One client type serves both, distinguished by `OpenAiConfig`.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, ImageProvider, ImageRequest,
    ImageResponse, LlmError, LlmProvider, Message, MessageRole, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const NEBIUS_BASE_URL: &str = "https://api.studio.nebius.ai/v1";

/// OpenAI-compatible provider configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Name reported by the provider (used in logs)
    pub name: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            api_key: String::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("name", &self.name)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// OpenAI-compatible provider implementation
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new provider
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(format!(
                "{} API key is required",
                config.name
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Convert completion request to wire format (pure function)
    fn convert_to_openai_request(request: &CompletionRequest) -> OpenAiCompletionRequest {
        OpenAiCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature,
        }
    }

    /// Convert image request to wire format (pure function)
    fn convert_to_image_request(request: &ImageRequest) -> OpenAiImageRequest {
        OpenAiImageRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            response_format: "b64_json".to_string(),
            response_extension: request.extension.clone(),
            width: request.width,
            height: request.height,
            num_inference_steps: request.inference_steps,
            negative_prompt: request.negative_prompt.clone(),
            seed: request.seed,
        }
    }

    /// Parse completion response (pure function)
    fn parse_completion_response(
        openai_response: OpenAiCompletionResponse,
    ) -> Result<CompletionResponse, LlmError> {
        let Some(choice) = openai_response.choices.into_iter().next() else {
            return Err(LlmError::InvalidResponse(
                "No choices returned from provider".to_string(),
            ));
        };

        let usage = openai_response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            model: openai_response.model,
            usage,
            finish_reason: Self::convert_finish_reason(choice.finish_reason),
        })
    }

    /// Parse image response (pure function)
    fn parse_image_response(
        openai_response: OpenAiImageResponse,
        request: &ImageRequest,
    ) -> Result<ImageResponse, LlmError> {
        let b64_data = openai_response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| {
                LlmError::InvalidResponse("No image data returned from provider".to_string())
            })?;

        Ok(ImageResponse {
            model: request.model.clone(),
            b64_data,
            extension: request.extension.clone(),
        })
    }

    /// Convert finish reason to internal format (pure function)
    fn convert_finish_reason(reason: Option<String>) -> FinishReason {
        match reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    fn convert_message(message: &Message) -> OpenAiMessage {
        OpenAiMessage {
            role: match message.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: Some(message.content.clone()),
        }
    }

    /// Map a non-success HTTP status to a provider error (pure)
    fn classify_status(name: &str, status: StatusCode, body: &str) -> LlmError {
        let message = format!("{name} API error: {status} - {body}");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationFailed(message)
            }
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded(message),
            _ => LlmError::ApiError(message),
        }
    }

    /// Make single API request (impure I/O). No retries.
    async fn post_json<Req, Resp>(&self, endpoint: &str, body: &Req) -> Result<Resp, LlmError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.config.base_url, endpoint))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let error_msg = format!(
                    "HTTP request failed: {} (is_connect: {}, is_timeout: {})",
                    e,
                    e.is_connect(),
                    e.is_timeout()
                );
                warn!(provider = %self.config.name, "network error: {}", error_msg);
                LlmError::NetworkError(error_msg)
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                provider = %self.config.name,
                "API error - Status: {}, Response: {}",
                status, error_text
            );
            return Err(Self::classify_status(&self.config.name, status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let openai_request = Self::convert_to_openai_request(&request);
        debug!(
            provider = %self.config.name,
            model = %openai_request.model,
            "chat completion request: {} messages",
            openai_request.messages.len()
        );

        let openai_response: OpenAiCompletionResponse =
            self.post_json("chat/completions", &openai_request).await?;
        let response = Self::parse_completion_response(openai_response)?;

        debug!(
            provider = %self.config.name,
            "chat completion response: {} tokens used, finish_reason: {:?}",
            response.usage.total_tokens,
            response.finish_reason
        );
        Ok(response)
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageResponse, LlmError> {
        let image_request = Self::convert_to_image_request(&request);
        debug!(
            provider = %self.config.name,
            model = %image_request.model,
            "image request: {}x{}, {} steps",
            image_request.width,
            image_request.height,
            image_request.num_inference_steps
        );

        let openai_response: OpenAiImageResponse =
            self.post_json("images/generations", &image_request).await?;
        Self::parse_image_response(openai_response, &request)
    }
}

#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Image generation body; the non-standard fields are Nebius extensions
#[derive(Debug, Serialize)]
struct OpenAiImageRequest {
    model: String,
    prompt: String,
    response_format: String,
    response_extension: String,
    width: u32,
    height: u32,
    num_inference_steps: u32,
    negative_prompt: String,
    seed: i64,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    #[serde(default)]
    b64_json: Option<String>,
}
