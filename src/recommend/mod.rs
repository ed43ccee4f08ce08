//! Playlist recommendation.
//!
//! The engine owns no ranking logic: it hands emotion and context to the
//! inference provider and returns the provider's ordering untouched. Any
//! provider failure collapses into a single unified error, never a partial
//! playlist.

use crate::context::RecommendationContext;
use crate::inference::{InferenceProvider, ProviderError};
use crate::model::{Emotion, Song};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
#[error("recommendation failed: {0}")]
pub struct RecommendError(#[from] ProviderError);

pub struct RecommendationEngine {
    provider: Arc<dyn InferenceProvider>,
}

impl RecommendationEngine {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    pub async fn recommend(
        &self,
        emotion: Emotion,
        context: &RecommendationContext,
    ) -> Result<Vec<Song>, RecommendError> {
        debug!(
            emotion = %emotion,
            platform = %context.platform,
            weather = %context.weather,
            time_of_day = %context.time_of_day,
            liked = context.feedback_history.liked.len(),
            disliked = context.feedback_history.disliked.len(),
            "Requesting playlist"
        );

        let playlist = self.provider.recommend(emotion, context).await?;

        info!(songs = playlist.len(), emotion = %emotion, "Playlist received");
        Ok(playlist)
    }
}
