//! Emotion classification over the three input modalities.

use crate::inference::{InferenceProvider, ProviderError};
use crate::model::EmotionReading;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Camera readings below this confidence are rejected. The boundary is
/// inclusive: exactly 0.6 is accepted.
pub const CAMERA_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Fixed confidence assigned to text classifications.
const TEXT_CONFIDENCE: f32 = 0.9;

/// Fixed confidence assigned to voice-description classifications.
const VOICE_CONFIDENCE: f32 = 0.8;

/// Mood capture, tagged by modality.
#[derive(Debug, Clone)]
pub enum MoodInput {
    /// A base64-encoded camera frame.
    Camera { image_base64: String },
    /// Free text describing how the user feels.
    Text(String),
    /// A textual description of the user's vocal tone.
    Voice(String),
}

impl MoodInput {
    pub fn modality(&self) -> &'static str {
        match self {
            MoodInput::Camera { .. } => "camera",
            MoodInput::Text(_) => "text",
            MoodInput::Voice(_) => "voice",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("emotion reading below confidence threshold ({confidence:.2})")]
    LowConfidence { confidence: f32 },
}

/// Classifies mood input into an emotion reading.
///
/// Only the camera modality is confidence-gated: camera frames are
/// inherently noisier than a user's own words, so text and voice readings
/// carry fixed confidences and are accepted whenever the provider succeeds.
pub struct EmotionClassifier {
    provider: Arc<dyn InferenceProvider>,
}

impl EmotionClassifier {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    pub async fn classify(&self, input: &MoodInput) -> Result<EmotionReading, ClassifyError> {
        debug!(
            modality = input.modality(),
            provider = self.provider.name(),
            "Classifying mood input"
        );

        match input {
            MoodInput::Camera { image_base64 } => {
                let reading = self.provider.classify_face(image_base64).await?;
                if reading.confidence < CAMERA_CONFIDENCE_THRESHOLD {
                    warn!(
                        emotion = %reading.emotion,
                        confidence = reading.confidence,
                        "Camera reading rejected below confidence threshold"
                    );
                    return Err(ClassifyError::LowConfidence {
                        confidence: reading.confidence,
                    });
                }
                Ok(reading)
            }
            MoodInput::Text(text) => {
                let emotion = self.provider.classify_text(text).await?;
                Ok(EmotionReading {
                    emotion,
                    confidence: TEXT_CONFIDENCE,
                })
            }
            MoodInput::Voice(description) => {
                let emotion = self.provider.classify_voice_description(description).await?;
                Ok(EmotionReading {
                    emotion,
                    confidence: VOICE_CONFIDENCE,
                })
            }
        }
    }
}
