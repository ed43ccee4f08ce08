//! End-to-end session flow tests with stubbed providers.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use melomood::classifier::{EmotionClassifier, MoodInput};
use melomood::context::RecommendationContext;
use melomood::feedback::{FeedbackStore, SqliteDurableStore};
use melomood::inference::{InferenceProvider, ProviderError};
use melomood::model::{
    Emotion, EmotionReading, FeedbackKind, Platform, Song, Weather, WeatherSource,
};
use melomood::recommend::RecommendationEngine;
use melomood::session::{SessionController, SessionState, SubmitOutcome};
use melomood::weather::{WeatherError, WeatherProvider};

/// Inference stub that records the last recommendation context it was
/// handed, so tests can assert the pass-through contract.
struct RecordingInference {
    face_confidence: f32,
    playlist: Vec<Song>,
    seen_context: Mutex<Option<RecommendationContext>>,
}

impl RecordingInference {
    fn new(face_confidence: f32, playlist: Vec<Song>) -> Self {
        Self {
            face_confidence,
            playlist,
            seen_context: Mutex::new(None),
        }
    }
}

#[async_trait]
impl InferenceProvider for RecordingInference {
    fn name(&self) -> &str {
        "recording-stub"
    }

    async fn classify_face(&self, _image: &str) -> Result<EmotionReading, ProviderError> {
        Ok(EmotionReading {
            emotion: Emotion::Energetic,
            confidence: self.face_confidence,
        })
    }

    async fn classify_text(&self, text: &str) -> Result<Emotion, ProviderError> {
        if text.contains("great") {
            Ok(Emotion::Happy)
        } else {
            Ok(Emotion::Neutral)
        }
    }

    async fn classify_voice_description(&self, _d: &str) -> Result<Emotion, ProviderError> {
        Ok(Emotion::Calm)
    }

    async fn recommend(
        &self,
        _emotion: Emotion,
        context: &RecommendationContext,
    ) -> Result<Vec<Song>, ProviderError> {
        *self.seen_context.lock().unwrap() = Some(context.clone());
        Ok(self.playlist.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct FixedWeather(Weather);

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn fetch_by_location(&self) -> Result<Weather, WeatherError> {
        Ok(self.0)
    }
}

fn sample_playlist() -> Vec<Song> {
    vec![
        Song::new("Mr. Blue Sky", "Electric Light Orchestra", "Out of the Blue"),
        Song::new("September", "Earth, Wind & Fire", "The Best of Earth, Wind & Fire"),
    ]
}

fn controller_on(
    provider: Arc<RecordingInference>,
    store: Arc<SqliteDurableStore>,
) -> SessionController {
    SessionController::new(
        EmotionClassifier::new(provider.clone()),
        RecommendationEngine::new(provider),
        FeedbackStore::load(store),
        Arc::new(FixedWeather(Weather::Cloudy)),
        Platform::Spotify,
    )
}

#[tokio::test]
async fn full_text_cycle_reaches_result_with_playlist() {
    let provider = Arc::new(RecordingInference::new(0.9, sample_playlist()));
    let store = Arc::new(SqliteDurableStore::in_memory().unwrap());
    let mut controller = controller_on(provider, store);

    let outcome = controller
        .submit(MoodInput::Text("I feel great".to_string()))
        .await;

    assert_eq!(outcome, SubmitOutcome::Completed);
    match controller.state() {
        SessionState::Result { emotion, playlist, .. } => {
            assert_eq!(*emotion, Emotion::Happy);
            assert_eq!(playlist, &sample_playlist());
        }
        other => panic!("expected Result, got {:?}", other),
    }
}

#[tokio::test]
async fn feedback_from_one_session_biases_the_next_cycles_context() {
    let provider = Arc::new(RecordingInference::new(0.9, sample_playlist()));
    let store = Arc::new(SqliteDurableStore::in_memory().unwrap());

    // First session: like a song, flush to the durable store.
    {
        let mut controller = controller_on(provider.clone(), store.clone());
        controller.submit(MoodInput::Text("great".to_string())).await;
        controller.give_feedback(sample_playlist()[0].clone(), FeedbackKind::Like);
        controller.flush_feedback().unwrap();
    }

    // Second session loads the same store; its cycle's context must carry
    // the persisted like.
    let mut controller = controller_on(provider.clone(), store);
    assert!(controller
        .feedback_history()
        .is_liked(&sample_playlist()[0]));

    controller.submit(MoodInput::Voice("soft".to_string())).await;
    let context = provider.seen_context.lock().unwrap().clone().unwrap();
    assert_eq!(context.feedback_history.liked.len(), 1);
    assert_eq!(context.feedback_history.liked[0].title, "Mr. Blue Sky");
    assert_eq!(context.platform, Platform::Spotify);
}

#[tokio::test]
async fn low_confidence_camera_cycle_fails_back_to_input() {
    let provider = Arc::new(RecordingInference::new(0.59, sample_playlist()));
    let store = Arc::new(SqliteDurableStore::in_memory().unwrap());
    let mut controller = controller_on(provider.clone(), store);

    let outcome = controller
        .submit(MoodInput::Camera {
            image_base64: "Zm9v".to_string(),
        })
        .await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert!(matches!(
        controller.state(),
        SessionState::Input { error: Some(_) }
    ));
    // The recommendation provider must never have been consulted.
    assert!(provider.seen_context.lock().unwrap().is_none());
}

#[tokio::test]
async fn weather_refresh_feeds_the_next_context() {
    let provider = Arc::new(RecordingInference::new(0.9, sample_playlist()));
    let store = Arc::new(SqliteDurableStore::in_memory().unwrap());
    let mut controller = controller_on(provider.clone(), store);

    controller.refresh_weather().await;
    assert_eq!(controller.weather(), Weather::Cloudy);
    assert_eq!(controller.weather_source(), WeatherSource::Auto);

    controller.submit(MoodInput::Text("great".to_string())).await;
    let context = provider.seen_context.lock().unwrap().clone().unwrap();
    assert_eq!(context.weather, Weather::Cloudy);
}

#[tokio::test]
async fn reset_returns_to_clean_input_and_keeps_feedback() {
    let provider = Arc::new(RecordingInference::new(0.9, sample_playlist()));
    let store = Arc::new(SqliteDurableStore::in_memory().unwrap());
    let mut controller = controller_on(provider, store);

    controller.submit(MoodInput::Text("great".to_string())).await;
    controller.give_feedback(sample_playlist()[1].clone(), FeedbackKind::Dislike);
    controller.reset();

    assert_eq!(*controller.state(), SessionState::Input { error: None });
    // Reset clears the session, not the feedback history.
    assert!(controller
        .feedback_history()
        .is_disliked(&sample_playlist()[1]));
}

#[tokio::test]
async fn persisted_feedback_survives_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("feedback.db");
    let provider = Arc::new(RecordingInference::new(0.9, sample_playlist()));

    {
        let store = Arc::new(SqliteDurableStore::new(&db_path).unwrap());
        let mut controller = controller_on(provider.clone(), store);
        controller.submit(MoodInput::Text("great".to_string())).await;
        controller.give_feedback(sample_playlist()[0].clone(), FeedbackKind::Like);
        controller.flush_feedback().unwrap();
    }

    let store = Arc::new(SqliteDurableStore::new(&db_path).unwrap());
    let controller = controller_on(provider, store);
    assert!(controller
        .feedback_history()
        .is_liked(&sample_playlist()[0]));
}
