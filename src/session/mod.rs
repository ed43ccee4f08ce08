//! Session state machine.
//!
//! Drives the input -> analyzing -> result flow and mediates between the
//! classifier, the context assembly, the recommendation engine and the
//! feedback store. One controller, one logical thread of control: all
//! external calls are awaited sequentially within a cycle.

use crate::classifier::{ClassifyError, EmotionClassifier, MoodInput};
use crate::context;
use crate::feedback::FeedbackStore;
use crate::model::{
    Emotion, FeedbackHistory, FeedbackKind, Platform, Song, TimeOfDay, Weather, WeatherSource,
};
use crate::recommend::{RecommendError, RecommendationEngine};
use crate::weather::WeatherProvider;
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Step the session is in, carrying only the fields valid for that step.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for mood input. `error` holds the message from a failed
    /// cycle, if any.
    Input { error: Option<String> },

    /// An analysis cycle is in flight.
    Analyzing,

    /// A playlist was generated.
    Result {
        emotion: Emotion,
        playlist: Vec<Song>,
        search_query: String,
    },
}

impl SessionState {
    pub fn is_input(&self) -> bool {
        matches!(self, SessionState::Input { .. })
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self, SessionState::Analyzing)
    }

    pub fn is_result(&self) -> bool {
        matches!(self, SessionState::Result { .. })
    }
}

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The cycle completed and the session is in `Result`.
    Completed,
    /// The cycle failed and the session is back in `Input` with an error.
    Failed,
    /// A cycle was already in flight; the submission was dropped.
    Rejected,
}

#[derive(Debug, Error)]
enum AnalysisError {
    #[error(transparent)]
    Classification(#[from] ClassifyError),

    #[error(transparent)]
    Recommendation(#[from] RecommendError),
}

impl AnalysisError {
    fn user_message(&self) -> String {
        match self {
            AnalysisError::Classification(ClassifyError::LowConfidence { .. }) => {
                "Could not confidently detect an emotion. Please try again with \
                 better lighting, or describe your mood in text."
                    .to_string()
            }
            _ => "An error occurred while generating your playlist. Please try again.".to_string(),
        }
    }
}

pub struct SessionController {
    state: SessionState,
    classifier: EmotionClassifier,
    engine: RecommendationEngine,
    feedback: FeedbackStore,
    weather_provider: Arc<dyn WeatherProvider>,
    platform: Platform,
    weather: Weather,
    weather_source: WeatherSource,
    weather_notice: Option<String>,
    time_of_day: TimeOfDay,
}

impl SessionController {
    pub fn new(
        classifier: EmotionClassifier,
        engine: RecommendationEngine,
        feedback: FeedbackStore,
        weather_provider: Arc<dyn WeatherProvider>,
        platform: Platform,
    ) -> Self {
        Self {
            state: SessionState::Input { error: None },
            classifier,
            engine,
            feedback,
            weather_provider,
            platform,
            weather: Weather::Sunny,
            weather_source: WeatherSource::Auto,
            weather_notice: None,
            time_of_day: TimeOfDay::now(),
        }
    }

    /// Run one analysis cycle for the given input.
    ///
    /// Submissions while a cycle is in flight are rejected, not queued.
    pub async fn submit(&mut self, input: MoodInput) -> SubmitOutcome {
        if self.state.is_analyzing() {
            warn!(
                modality = input.modality(),
                "Submission dropped: analysis already in flight"
            );
            return SubmitOutcome::Rejected;
        }

        // Entering Analyzing discards any prior error and playlist.
        self.state = SessionState::Analyzing;

        match self.run_cycle(&input).await {
            Ok((emotion, playlist)) => {
                info!(emotion = %emotion, songs = playlist.len(), "Analysis cycle complete");
                self.state = SessionState::Result {
                    emotion,
                    playlist,
                    search_query: String::new(),
                };
                SubmitOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "Analysis cycle failed");
                self.state = SessionState::Input {
                    error: Some(e.user_message()),
                };
                SubmitOutcome::Failed
            }
        }
    }

    /// Classification fully resolves before the recommendation call; the
    /// context is snapshotted exactly once per cycle.
    async fn run_cycle(&self, input: &MoodInput) -> Result<(Emotion, Vec<Song>), AnalysisError> {
        let reading = self.classifier.classify(input).await?;
        let context = context::assemble(
            self.platform,
            self.weather,
            self.time_of_day,
            self.feedback.history(),
        );
        let playlist = self.engine.recommend(reading.emotion, &context).await?;
        Ok((reading.emotion, playlist))
    }

    /// Return to a clean `Input` state, dropping emotion, playlist, error
    /// and search query.
    pub fn reset(&mut self) {
        self.state = SessionState::Input { error: None };
    }

    /// Record a like/dislike on a recommended song. Only valid while a
    /// result is displayed; ignored elsewhere.
    pub fn give_feedback(&mut self, song: Song, kind: FeedbackKind) {
        if !self.state.is_result() {
            warn!(title = %song.title, "Feedback dropped outside result state");
            return;
        }
        self.feedback.record(song, kind);
    }

    pub fn clear_feedback(&mut self) {
        self.feedback.clear();
    }

    /// Synchronously persist the feedback history, for shutdown.
    pub fn flush_feedback(&self) -> Result<()> {
        self.feedback.flush()
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Pick a weather value by hand, marking the provenance as manual.
    pub fn set_weather_manual(&mut self, weather: Weather) {
        self.weather = weather;
        self.weather_source = WeatherSource::Manual;
        self.weather_notice = None;
    }

    /// Ask the weather provider for the current conditions. On failure the
    /// previous value is kept, provenance falls back to manual and a
    /// non-blocking notice is surfaced.
    pub async fn refresh_weather(&mut self) {
        self.weather_notice = None;
        self.weather_source = WeatherSource::Auto;
        match self.weather_provider.fetch_by_location().await {
            Ok(weather) => {
                info!(weather = %weather, "Weather detected");
                self.weather = weather;
            }
            Err(e) => {
                warn!(error = %e, "Weather lookup failed, falling back to manual selection");
                self.weather_source = WeatherSource::Manual;
                self.weather_notice = Some(e.to_string());
            }
        }
    }

    /// Recompute the time-of-day bucket from the wall clock. Called
    /// hourly by the driver, between cycles; an in-flight cycle keeps the
    /// snapshot it already captured.
    pub fn refresh_time_of_day(&mut self) {
        self.time_of_day = TimeOfDay::now();
    }

    /// Update the playlist search query. Only meaningful on the result
    /// view; a no-op elsewhere.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        if let SessionState::Result { search_query, .. } = &mut self.state {
            *search_query = query.into();
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn feedback_history(&self) -> &FeedbackHistory {
        self.feedback.history()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn weather_source(&self) -> WeatherSource {
        self.weather_source
    }

    pub fn weather_notice(&self) -> Option<&str> {
        self.weather_notice.as_deref()
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }
}
