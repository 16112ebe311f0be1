//! Provider implementations
//!
//! Both backends speak the OpenAI wire format, so a single client covers them.

pub mod openai;

pub use openai::*;
