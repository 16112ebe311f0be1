//! Configuration system for the MultiMind router
//!
//! Every field has a default, so running without a config file reproduces the
//! stock routing policy. A TOML file can override any section. Credentials are
//! never stored in the config itself; it only names the files holding them.

use crate::error::StartupResult;
use crate::llm::providers::openai::{
    OpenAiConfig, OpenAiProvider, NEBIUS_BASE_URL, OPENAI_BASE_URL,
};
use crate::routing::classifier::{
    KeywordClassifier, DEFAULT_CODE_KEYWORDS, DEFAULT_IMAGE_KEYWORDS,
};
use crate::routing::dispatcher::{
    DispatchSettings, ImageOptions, DEFAULT_CODE_PROMPT, DEFAULT_CONVERSATIONAL_MODEL,
    DEFAULT_CONVERSATIONAL_PROMPT, DEFAULT_IMAGE_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TEXT_MODEL,
};
use crate::routing::{Dispatcher, RequestRouter};
use crate::sink::{default_image_path, FileImageSink};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Locations searched when no config path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["multimind.toml", "config/multimind.toml"];

/// Main router configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RouterConfig {
    #[serde(default)]
    pub credentials: CredentialsSection,
    #[serde(default)]
    pub conversational: ConversationalSection,
    #[serde(default)]
    pub multi_model: MultiModelSection,
    #[serde(default)]
    pub image: ImageSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
}

/// Credential file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialsSection {
    /// File holding the conversational provider's API key
    #[serde(default = "default_openai_key_file")]
    pub openai_key_file: PathBuf,
    /// File holding the multi-model provider's API key
    #[serde(default = "default_nebius_key_file")]
    pub nebius_key_file: PathBuf,
}

/// Conversational provider section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationalSection {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_conversational_model")]
    pub model: String,
    #[serde(default = "default_conversational_prompt")]
    pub system_prompt: String,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP timeout for one provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Multi-model provider section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiModelSection {
    #[serde(default = "default_nebius_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_code_prompt")]
    pub code_system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Image generation parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSection {
    #[serde(default = "default_image_side")]
    pub width: u32,
    #[serde(default = "default_image_side")]
    pub height: u32,
    #[serde(default = "default_inference_steps")]
    pub inference_steps: u32,
    #[serde(default)]
    pub negative_prompt: String,
    /// -1 leaves the seed unconstrained
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Where generated images go
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    /// Defaults to `output_generated_image.<image.extension>`
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    /// Command launched with the image path after each write
    #[serde(default)]
    pub viewer: Option<String>,
}

/// Classifier keyword lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierSection {
    #[serde(default = "default_image_keywords")]
    pub image_keywords: Vec<String>,
    #[serde(default = "default_code_keywords")]
    pub code_keywords: Vec<String>,
}

fn default_openai_key_file() -> PathBuf {
    PathBuf::from("keys/openai_api_key.txt")
}

fn default_nebius_key_file() -> PathBuf {
    PathBuf::from("keys/nebius_api_key.txt")
}

fn default_openai_base_url() -> String {
    OPENAI_BASE_URL.to_string()
}

fn default_nebius_base_url() -> String {
    NEBIUS_BASE_URL.to_string()
}

fn default_conversational_model() -> String {
    DEFAULT_CONVERSATIONAL_MODEL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_conversational_prompt() -> String {
    DEFAULT_CONVERSATIONAL_PROMPT.to_string()
}

fn default_code_prompt() -> String {
    DEFAULT_CODE_PROMPT.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_image_side() -> u32 {
    1024
}

fn default_inference_steps() -> u32 {
    28
}

fn default_seed() -> i64 {
    -1
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_image_keywords() -> Vec<String> {
    DEFAULT_IMAGE_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_code_keywords() -> Vec<String> {
    DEFAULT_CODE_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            openai_key_file: default_openai_key_file(),
            nebius_key_file: default_nebius_key_file(),
        }
    }
}

impl Default for ConversationalSection {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_conversational_model(),
            system_prompt: default_conversational_prompt(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MultiModelSection {
    fn default() -> Self {
        Self {
            base_url: default_nebius_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            code_system_prompt: default_code_prompt(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            width: default_image_side(),
            height: default_image_side(),
            inference_steps: default_inference_steps(),
            negative_prompt: String::new(),
            seed: default_seed(),
            extension: default_extension(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            image_path: None,
            viewer: None,
        }
    }
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            image_keywords: default_image_keywords(),
            code_keywords: default_code_keywords(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to render TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),
    #[error("Credential file {path} could not be read: {source}")]
    CredentialUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Credential file {0} is empty")]
    CredentialEmpty(PathBuf),
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// API keys loaded at startup
#[derive(Clone, PartialEq)]
pub struct ApiCredentials {
    pub openai_api_key: String,
    pub nebius_api_key: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("openai_api_key", &"***")
            .field("nebius_api_key", &"***")
            .finish()
    }
}

impl CredentialsSection {
    /// Read both API keys. Any missing or empty file is an error.
    pub fn load(&self) -> Result<ApiCredentials, ConfigError> {
        Ok(ApiCredentials {
            openai_api_key: read_credential(&self.openai_key_file)?,
            nebius_api_key: read_credential(&self.nebius_key_file)?,
        })
    }
}

/// Read a credential file, trimming surrounding whitespace
pub fn read_credential(path: &Path) -> Result<String, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let key = content.trim();
    if key.is_empty() {
        return Err(ConfigError::CredentialEmpty(path.to_path_buf()));
    }
    Ok(key.to_string())
}

impl RouterConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("conversational.base_url", &self.conversational.base_url)?;
        validate_base_url("multi_model.base_url", &self.multi_model.base_url)?;
        validate_temperature("conversational.temperature", self.conversational.temperature)?;
        validate_temperature("multi_model.temperature", self.multi_model.temperature)?;

        if self.conversational.timeout_secs == 0 || self.multi_model.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.image.width == 0 || self.image.height == 0 {
            return Err(ConfigError::InvalidConfig(format!(
                "image dimensions must be positive, got {}x{}",
                self.image.width, self.image.height
            )));
        }
        if self.image.inference_steps == 0 {
            return Err(ConfigError::InvalidConfig(
                "image.inference_steps must be greater than zero".to_string(),
            ));
        }
        if self.image.extension.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "image.extension must not be empty".to_string(),
            ));
        }

        if let Some(path_extension) = self
            .output
            .image_path
            .as_deref()
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
        {
            if !path_extension.eq_ignore_ascii_case(self.image.extension.trim()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "output.image_path extension '{}' does not match image.extension '{}'",
                    path_extension, self.image.extension
                )));
            }
        }

        validate_keywords("classifier.image_keywords", &self.classifier.image_keywords)?;
        validate_keywords("classifier.code_keywords", &self.classifier.code_keywords)?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Per-category models, prompts and image parameters
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            conversational_model: self.conversational.model.clone(),
            conversational_prompt: self.conversational.system_prompt.clone(),
            conversational_temperature: self.conversational.temperature,
            text_model: self.multi_model.text_model.clone(),
            code_prompt: self.multi_model.code_system_prompt.clone(),
            code_temperature: self.multi_model.temperature,
            image_model: self.multi_model.image_model.clone(),
            image: ImageOptions {
                width: self.image.width,
                height: self.image.height,
                inference_steps: self.image.inference_steps,
                negative_prompt: self.image.negative_prompt.clone(),
                seed: self.image.seed,
                extension: self.image.extension.clone(),
            },
        }
    }

    pub fn keyword_classifier(&self) -> KeywordClassifier {
        KeywordClassifier::with_keywords(
            &self.classifier.image_keywords,
            &self.classifier.code_keywords,
        )
    }

    /// Where generated images are written
    pub fn image_path(&self) -> PathBuf {
        self.output
            .image_path
            .clone()
            .unwrap_or_else(|| default_image_path(self.image.extension.trim()))
    }

    pub fn image_sink(&self) -> FileImageSink {
        FileImageSink::new(self.image_path()).with_viewer(self.output.viewer.clone())
    }

    /// Load credentials and build the router with both providers injected.
    ///
    /// A missing or empty credential file fails here, before any input is read.
    pub fn build_router(&self) -> StartupResult<RequestRouter> {
        let credentials = self.credentials.load()?;

        let conversational =
            OpenAiProvider::new(self.conversational_provider_config(credentials.openai_api_key))?;
        let multi_model =
            OpenAiProvider::new(self.multi_model_provider_config(credentials.nebius_api_key))?;

        let dispatcher = Dispatcher::new(
            Arc::new(conversational),
            Arc::new(multi_model),
            Arc::new(self.image_sink()),
            self.dispatch_settings(),
        );

        Ok(RequestRouter::new(
            Box::new(self.keyword_classifier()),
            dispatcher,
        ))
    }

    pub fn conversational_provider_config(&self, api_key: String) -> OpenAiConfig {
        OpenAiConfig {
            name: "openai".to_string(),
            api_key,
            base_url: trim_base_url(&self.conversational.base_url),
            timeout: Duration::from_secs(self.conversational.timeout_secs),
        }
    }

    pub fn multi_model_provider_config(&self, api_key: String) -> OpenAiConfig {
        OpenAiConfig {
            name: "nebius".to_string(),
            api_key,
            base_url: trim_base_url(&self.multi_model.base_url),
            timeout: Duration::from_secs(self.multi_model.timeout_secs),
        }
    }
}

fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn validate_base_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

fn validate_temperature(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig(format!(
            "{field} must be between 0.0 and 2.0, got {value}"
        )))
    }
}

fn validate_keywords(field: &str, keywords: &[String]) -> Result<(), ConfigError> {
    if keywords.is_empty() {
        return Err(ConfigError::InvalidConfig(format!("{field} must not be empty")));
    }
    if keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::InvalidConfig(format!(
            "{field} must not contain blank keywords"
        )));
    }
    Ok(())
}
