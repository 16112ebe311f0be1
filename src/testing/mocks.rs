//! Mock implementations for testing
//!
//! Provides recording substitutes for the conversational provider, the
//! multi-model provider and the image sink, so dispatch decisions can be
//! verified without network access or file writes.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, ImageProvider, ImageRequest,
    ImageResponse, LlmError, LlmProvider, TokenUsage,
};
use crate::sink::{ImageSink, SinkError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which sub-model a provider call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubModel {
    Text,
    Image,
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Completion(CompletionRequest),
    Image(ImageRequest),
}

impl ProviderCall {
    pub fn sub_model(&self) -> SubModel {
        match self {
            ProviderCall::Completion(_) => SubModel::Text,
            ProviderCall::Image(_) => SubModel::Image,
        }
    }
}

/// Mock chat provider for testing
#[derive(Debug)]
pub struct MockLlmProvider {
    pub name: String,
    pub responses: Vec<Option<String>>,
    pub current_response: Arc<Mutex<usize>>,
    pub failure: Option<LlmError>,
    pub calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses: responses.into_iter().map(Some).collect(),
            current_response: Arc::new(Mutex::new(0)),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Every call fails with the given error
    pub fn with_failure(error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(vec![])
        }
    }

    /// Every call succeeds but carries no content
    pub fn without_content() -> Self {
        Self {
            responses: vec![None],
            ..Self::new(vec![])
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub async fn get_calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn next_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let model = request.model.clone();
        self.calls.lock().await.push(ProviderCall::Completion(request));

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            Some("Mock response".to_string())
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content,
            model,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.next_completion(request).await
    }
}

/// Mock multi-model provider recording which sub-model each call used
#[derive(Debug)]
pub struct MockMultiModelProvider {
    pub text: MockLlmProvider,
    pub image_payload: String,
    pub image_failure: Option<LlmError>,
    pub calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl MockMultiModelProvider {
    /// `image_payload` is returned verbatim as the base64 image data
    pub fn new(text_response: impl Into<String>, image_payload: impl Into<String>) -> Self {
        let text = MockLlmProvider::single_response(text_response).named("mock-multi");
        let calls = text.calls.clone();
        Self {
            text,
            image_payload: image_payload.into(),
            image_failure: None,
            calls,
        }
    }

    pub fn with_text_failure(mut self, error: LlmError) -> Self {
        self.text.failure = Some(error);
        self
    }

    pub fn with_image_failure(mut self, error: LlmError) -> Self {
        self.image_failure = Some(error);
        self
    }

    pub async fn get_calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    pub async fn invoked_sub_models(&self) -> Vec<SubModel> {
        self.calls
            .lock()
            .await
            .iter()
            .map(ProviderCall::sub_model)
            .collect()
    }
}

#[async_trait]
impl LlmProvider for MockMultiModelProvider {
    fn name(&self) -> &str {
        self.text.name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.text.next_completion(request).await
    }
}

#[async_trait]
impl ImageProvider for MockMultiModelProvider {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageResponse, LlmError> {
        let model = request.model.clone();
        let extension = request.extension.clone();
        self.calls.lock().await.push(ProviderCall::Image(request));

        if let Some(error) = &self.image_failure {
            return Err(error.clone());
        }

        Ok(ImageResponse {
            model,
            b64_data: self.image_payload.clone(),
            extension,
        })
    }
}

/// Mock image sink recording every delivered payload
#[derive(Debug, Default)]
pub struct MockImageSink {
    pub writes: std::sync::Mutex<Vec<Vec<u8>>>,
    pub should_fail: bool,
}

impl MockImageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ImageSink for MockImageSink {
    async fn deliver(&self, image: &[u8]) -> Result<PathBuf, SinkError> {
        let path = PathBuf::from("mock_image.png");
        if self.should_fail {
            return Err(SinkError::Write {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "mock sink failure",
                ),
            });
        }

        if let Ok(mut writes) = self.writes.lock() {
            writes.push(image.to_vec());
        }
        Ok(path)
    }
}
