//! Recommendation context assembly.
//!
//! The context bundles every non-emotion signal the recommendation provider
//! receives: platform, weather, time of day and a snapshot of the feedback
//! history. It is rebuilt fresh for every analysis cycle and never mutated.

use crate::model::{FeedbackHistory, Platform, TimeOfDay, Weather};
use serde::Serialize;

/// Immutable per-cycle snapshot of the recommendation signals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub platform: Platform,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
    pub feedback_history: FeedbackHistory,
}

/// Combine the current signals into a context. Pure; inputs are well-formed
/// by construction and there is no failure mode.
pub fn assemble(
    platform: Platform,
    weather: Weather,
    time_of_day: TimeOfDay,
    feedback_history: &FeedbackHistory,
) -> RecommendationContext {
    RecommendationContext {
        platform,
        weather,
        time_of_day,
        feedback_history: feedback_history.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeedbackKind, Song};

    #[test]
    fn test_assemble_snapshots_history() {
        let mut history = FeedbackHistory::default();
        history.record(Song::new("Clair de Lune", "Debussy", ""), FeedbackKind::Like);

        let context = assemble(
            Platform::Spotify,
            Weather::Rainy,
            TimeOfDay::Evening,
            &history,
        );

        // Later mutations must not affect the captured snapshot.
        history.clear();
        assert_eq!(context.feedback_history.liked.len(), 1);
    }

    #[test]
    fn test_context_serializes_with_original_field_names() {
        let context = assemble(
            Platform::YouTubeMusic,
            Weather::Sunny,
            TimeOfDay::Morning,
            &FeedbackHistory::default(),
        );
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["platform"], "YouTube Music");
        assert_eq!(json["timeOfDay"], "Morning");
        assert!(json["feedbackHistory"]["liked"].as_array().unwrap().is_empty());
    }
}
