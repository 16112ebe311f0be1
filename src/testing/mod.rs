//! Testing utilities and mock implementations
//!
//! This module provides substitutes for the providers and the image sink so the
//! router can be tested without network access.

pub mod mocks;

pub use mocks::*;
