//! Inference provider abstraction layer.
//!
//! This module provides a trait-based abstraction over the model backend
//! that performs emotion classification and playlist generation, so the
//! core flow never depends on a concrete inference service.

mod ollama;
mod provider;

pub use ollama::OllamaProvider;
pub use provider::{InferenceProvider, ProviderError};
