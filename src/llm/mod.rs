//! Provider abstraction layer
//!
//! This module provides a provider-agnostic interface for chat completion and
//! image synthesis, plus the OpenAI-compatible HTTP implementation.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
