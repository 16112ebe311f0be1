//! Error types for the router binary and failure-message sanitization
//!
//! Provider and routing failures never surface as `Err` past the dispatcher;
//! they become [`crate::routing::GenerationResult::Failure`] values whose cause
//! text passes through [`sanitize_error_message`]. Only startup failures are
//! fatal.

use crate::config::ConfigError;
use crate::llm::provider::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Maximum length of a user-visible failure cause
pub const MAX_CAUSE_LEN: usize = 500;

const TRUNCATE_SUFFIX: &str = "...[truncated]";

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SECRET_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|keys|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("secret path pattern is valid")
});

/// Fatal errors raised before the interaction loop starts
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for startup operations
pub type StartupResult<T> = Result<T, StartupError>;

/// Redact credentials and secret-looking paths, then cap the length
pub fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SECRET_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .into_owned();

    if sanitized.len() > MAX_CAUSE_LEN {
        let mut end = MAX_CAUSE_LEN - TRUNCATE_SUFFIX.len();
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
        sanitized.push_str(TRUNCATE_SUFFIX);
    }

    sanitized
}
