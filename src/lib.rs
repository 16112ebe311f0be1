//! MultiMind - single-turn request router
//!
//! Classifies one free-text utterance as text, code or image work and
//! dispatches it to the matching generation provider.
//!
//! # Overview
//!
//! - Keyword classifier with image-over-code priority
//! - Dispatcher over a conversational provider and a multi-model provider
//! - OpenAI-compatible HTTP provider adapters
//! - Image sink for generated images
//! - Interactive line-oriented session
//!
//! # Quick Start
//!
//! ```rust
//! use multimind::routing::{Classifier, KeywordClassifier, TaskCategory};
//!
//! let classifier = KeywordClassifier::new();
//!
//! assert_eq!(classifier.classify("draw me a function"), TaskCategory::Image);
//! assert_eq!(classifier.classify("write a python script"), TaskCategory::Code);
//! assert_eq!(classifier.classify("what is the capital of France?"), TaskCategory::Text);
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod routing;
pub mod session;
pub mod sink;
pub mod testing;

pub use config::{ApiCredentials, ConfigError, RouterConfig};
pub use error::{StartupError, StartupResult};
pub use routing::{
    Classifier, Dispatcher, GenerationResult, KeywordClassifier, RequestRouter, TaskCategory,
};
pub use session::{is_exit_command, run_session, SessionEnd, SessionSummary};
pub use sink::{FileImageSink, ImageSink};
