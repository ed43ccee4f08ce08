//! Inference provider trait definition.

use crate::context::RecommendationContext;
use crate::model::{Emotion, EmotionReading, Song};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with an inference provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for emotion/playlist inference providers.
///
/// Implementations of this trait can connect to different model backends
/// while presenting a unified interface to the classifier and the
/// recommendation engine.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Get the provider's name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Classify the dominant emotion in a camera frame.
    ///
    /// Returns the detected emotion together with the provider-reported
    /// confidence in `[0, 1]`.
    async fn classify_face(&self, image_base64: &str) -> Result<EmotionReading, ProviderError>;

    /// Classify the emotion expressed in free text.
    async fn classify_text(&self, text: &str) -> Result<Emotion, ProviderError>;

    /// Classify the emotion from a textual description of vocal tone.
    async fn classify_voice_description(
        &self,
        description: &str,
    ) -> Result<Emotion, ProviderError>;

    /// Generate an ordered playlist for an emotion and context.
    ///
    /// The context (platform, weather, time of day, liked/disliked songs)
    /// is passed through unmodified; how it biases the result is entirely
    /// the provider's contract.
    async fn recommend(
        &self,
        emotion: Emotion,
        context: &RecommendationContext,
    ) -> Result<Vec<Song>, ProviderError>;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
