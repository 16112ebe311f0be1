//! Observability for the MultiMind router
//!
//! Structured logging via `tracing`, configured from the environment.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
