//! Category-to-provider dispatch
//!
//! The dispatcher owns the provider clients (built once at startup and
//! injected here) and turns every outcome into a [`GenerationResult`]. Nothing
//! below this boundary escapes as an error: provider, decode and sink failures
//! all come back as [`GenerationResult::Failure`].
//!
//! Routing policy:
//!
//! ```text
//! Text  -> conversational provider (chat completion)
//! Code  -> multi-model provider, text sub-model
//! Image -> multi-model provider, image sub-model -> ImageSink
//! ```

use crate::error::sanitize_error_message;
use crate::llm::provider::{
    CompletionRequest, ImageRequest, LlmError, LlmProvider, MultiModelProvider,
};
use crate::routing::classifier::TaskCategory;
use crate::sink::ImageSink;
use base64::Engine;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_CONVERSATIONAL_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEXT_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/flux-dev";
pub const DEFAULT_CONVERSATIONAL_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_CODE_PROMPT: &str = "You are a smart assistant that writes code.";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Fixed image generation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub width: u32,
    pub height: u32,
    pub inference_steps: u32,
    pub negative_prompt: String,
    /// `-1` leaves the seed unconstrained
    pub seed: i64,
    pub extension: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            inference_steps: 28,
            negative_prompt: String::new(),
            seed: -1,
            extension: "png".to_string(),
        }
    }
}

/// Models, prompts and sampling parameters used per category
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub conversational_model: String,
    pub conversational_prompt: String,
    pub conversational_temperature: f32,
    pub text_model: String,
    pub code_prompt: String,
    pub code_temperature: f32,
    pub image_model: String,
    pub image: ImageOptions,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            conversational_model: DEFAULT_CONVERSATIONAL_MODEL.to_string(),
            conversational_prompt: DEFAULT_CONVERSATIONAL_PROMPT.to_string(),
            conversational_temperature: DEFAULT_TEMPERATURE,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            code_prompt: DEFAULT_CODE_PROMPT.to_string(),
            code_temperature: DEFAULT_TEMPERATURE,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image: ImageOptions::default(),
        }
    }
}

/// An utterance paired with its resolved category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub utterance: &'a str,
    pub category: TaskCategory,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(utterance: &'a str, category: TaskCategory) -> Self {
        Self {
            utterance,
            category,
        }
    }
}

/// Which step of the dispatch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Conversational,
    Code,
    Image,
    UnknownTask,
}

/// Failure descriptor with a sanitized, human-readable cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub cause: String,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, cause: impl AsRef<str>) -> Self {
        Self {
            kind,
            cause: sanitize_error_message(cause.as_ref()),
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Conversational => {
                write!(f, "Error using conversational model: {}", self.cause)
            }
            FailureKind::Code => write!(
                f,
                "Error generating code via multi-model provider: {}",
                self.cause
            ),
            FailureKind::Image => write!(
                f,
                "Error generating image via multi-model provider: {}",
                self.cause
            ),
            FailureKind::UnknownTask => write!(f, "Error: {}", self.cause),
        }
    }
}

/// Outcome of one dispatched request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    /// Trimmed completion text (Text and Code)
    Text(String),
    /// Image bytes were handed to the sink
    ImageDelivered { path: PathBuf },
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn failure(kind: FailureKind, cause: impl AsRef<str>) -> Self {
        Self::Failure(GenerationFailure::new(kind, cause))
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    pub fn as_failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::ImageDelivered { path } => write!(
                f,
                "Image generated successfully and saved to {}.",
                path.display()
            ),
            Self::Failure(failure) => write!(f, "{failure}"),
        }
    }
}

/// Selects and invokes a generation provider per task category
pub struct Dispatcher {
    conversational: Arc<dyn LlmProvider>,
    multi_model: Arc<dyn MultiModelProvider>,
    sink: Arc<dyn ImageSink>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        conversational: Arc<dyn LlmProvider>,
        multi_model: Arc<dyn MultiModelProvider>,
        sink: Arc<dyn ImageSink>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            conversational,
            multi_model,
            sink,
            settings,
        }
    }

    pub async fn dispatch(&self, utterance: &str, category: TaskCategory) -> GenerationResult {
        self.dispatch_request(GenerationRequest::new(utterance, category))
            .await
    }

    pub async fn dispatch_request(&self, request: GenerationRequest<'_>) -> GenerationResult {
        match request.category {
            TaskCategory::Text => self.converse(request.utterance).await,
            TaskCategory::Code => self.generate_code(request.utterance).await,
            TaskCategory::Image => self.generate_image(request.utterance).await,
        }
    }

    /// Dispatch by category label. Labels that name no category produce an
    /// unknown-task failure without calling any provider.
    pub async fn dispatch_label(&self, utterance: &str, label: &str) -> GenerationResult {
        match label.parse::<TaskCategory>() {
            Ok(category) => self.dispatch(utterance, category).await,
            Err(e) => {
                warn!(label, "refusing to dispatch unknown task type");
                GenerationResult::failure(FailureKind::UnknownTask, e.to_string())
            }
        }
    }

    async fn converse(&self, utterance: &str) -> GenerationResult {
        let request = CompletionRequest::single_turn(
            &self.settings.conversational_model,
            &self.settings.conversational_prompt,
            utterance,
            self.settings.conversational_temperature,
        );

        match complete_text(self.conversational.as_ref(), request).await {
            Ok(text) => GenerationResult::Text(text),
            Err(e) => {
                warn!(
                    provider = self.conversational.name(),
                    "conversational request failed: {}", e
                );
                GenerationResult::failure(FailureKind::Conversational, e.to_string())
            }
        }
    }

    async fn generate_code(&self, utterance: &str) -> GenerationResult {
        let request = CompletionRequest::single_turn(
            &self.settings.text_model,
            &self.settings.code_prompt,
            utterance,
            self.settings.code_temperature,
        );

        match complete_text(self.multi_model.as_ref(), request).await {
            Ok(text) => GenerationResult::Text(text),
            Err(e) => {
                warn!(provider = self.multi_model.name(), "code request failed: {}", e);
                GenerationResult::failure(FailureKind::Code, e.to_string())
            }
        }
    }

    async fn generate_image(&self, utterance: &str) -> GenerationResult {
        let options = &self.settings.image;
        let request = ImageRequest {
            model: self.settings.image_model.clone(),
            prompt: utterance.to_string(),
            width: options.width,
            height: options.height,
            inference_steps: options.inference_steps,
            negative_prompt: options.negative_prompt.clone(),
            seed: options.seed,
            extension: options.extension.clone(),
        };

        let response = match self.multi_model.generate_image(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = self.multi_model.name(), "image request failed: {}", e);
                return GenerationResult::failure(FailureKind::Image, e.to_string());
            }
        };

        let bytes = match decode_image(&response.b64_data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("image payload could not be decoded: {}", e);
                return GenerationResult::failure(FailureKind::Image, e.to_string());
            }
        };
        debug!(bytes = bytes.len(), format = %response.extension, "image decoded");

        match self.sink.deliver(&bytes).await {
            Ok(path) => GenerationResult::ImageDelivered { path },
            Err(e) => GenerationResult::failure(FailureKind::Image, e.to_string()),
        }
    }
}

/// Run a completion and return its trimmed text
async fn complete_text<P>(provider: &P, request: CompletionRequest) -> Result<String, LlmError>
where
    P: LlmProvider + ?Sized,
{
    let response = provider.complete(request).await?;
    response
        .content
        .map(|content| content.trim().to_string())
        .ok_or_else(|| LlmError::InvalidResponse("completion contained no content".to_string()))
}

fn decode_image(b64_data: &str) -> Result<Vec<u8>, LlmError> {
    base64::engine::general_purpose::STANDARD
        .decode(b64_data.trim())
        .map_err(|e| LlmError::InvalidResponse(format!("invalid base64 image payload: {e}")))
}
