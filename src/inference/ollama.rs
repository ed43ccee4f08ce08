//! Ollama inference provider implementation.

use super::provider::{InferenceProvider, ProviderError};
use crate::context::RecommendationContext;
use crate::model::{Emotion, EmotionReading, Song};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama inference provider.
///
/// Connects to an Ollama server and uses its `/api/chat` endpoint with
/// JSON-formatted responses for both emotion classification and playlist
/// generation.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Ollama server (e.g., "http://localhost:11434").
    /// * `model` - Model to use (e.g., "llama3.1:8b"); camera input needs a
    ///   multimodal model (e.g., "llava").
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one system+user exchange and return the raw assistant content.
    async fn chat(
        &self,
        system: &str,
        user: String,
        images: Option<Vec<String>>,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                    images: None,
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: user,
                    images,
                },
            ],
            stream: false,
            format: Some("json".to_string()),
            options: Some(OllamaOptions {
                temperature: Some(0.2),
            }),
        };

        debug!(model = %self.model, "Sending chat request to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let ollama_response: OllamaChatResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(ollama_response.message.content)
    }
}

/// Parse the JSON document the model was instructed to emit.
fn parse_payload<T: DeserializeOwned>(content: &str) -> Result<T, ProviderError> {
    serde_json::from_str(content.trim())
        .map_err(|e| ProviderError::InvalidResponse(format!("Malformed model output: {}", e)))
}

fn parse_emotion_label(label: &str) -> Result<Emotion, ProviderError> {
    label.parse().map_err(|_| {
        ProviderError::InvalidResponse(format!("Model produced an unknown emotion: {}", label))
    })
}

fn emotion_labels() -> String {
    Emotion::ALL
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl InferenceProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn classify_face(&self, image_base64: &str) -> Result<EmotionReading, ProviderError> {
        let system = format!(
            "You analyze facial expressions. Respond with a single JSON object \
             {{\"emotion\": <label>, \"confidence\": <number between 0 and 1>}} \
             where <label> is one of: {}.",
            emotion_labels()
        );

        let content = self
            .chat(
                &system,
                "What is the dominant emotion on this face?".to_string(),
                Some(vec![image_base64.to_string()]),
            )
            .await?;

        let payload: EmotionConfidencePayload = parse_payload(&content)?;
        let emotion = parse_emotion_label(&payload.emotion)?;

        debug!(emotion = %emotion, confidence = payload.confidence, "Face classified");

        Ok(EmotionReading {
            emotion,
            confidence: payload.confidence,
        })
    }

    async fn classify_text(&self, text: &str) -> Result<Emotion, ProviderError> {
        let system = format!(
            "You classify the emotion expressed in a short text. Respond with a \
             single JSON object {{\"emotion\": <label>}} where <label> is one \
             of: {}.",
            emotion_labels()
        );

        let content = self
            .chat(&system, format!("The text is: {}", text), None)
            .await?;

        let payload: EmotionPayload = parse_payload(&content)?;
        parse_emotion_label(&payload.emotion)
    }

    async fn classify_voice_description(
        &self,
        description: &str,
    ) -> Result<Emotion, ProviderError> {
        let system = format!(
            "You infer a speaker's emotion from a description of their vocal \
             tone. Respond with a single JSON object {{\"emotion\": <label>}} \
             where <label> is one of: {}.",
            emotion_labels()
        );

        let content = self
            .chat(
                &system,
                format!("The voice was described as: {}", description),
                None,
            )
            .await?;

        let payload: EmotionPayload = parse_payload(&content)?;
        parse_emotion_label(&payload.emotion)
    }

    async fn recommend(
        &self,
        emotion: Emotion,
        context: &RecommendationContext,
    ) -> Result<Vec<Song>, ProviderError> {
        let system = "You are a music curator. Given a listener's emotion and \
                      context, respond with a single JSON object \
                      {\"songs\": [{\"title\": ..., \"artist\": ..., \"album\": ...}, ...]} \
                      containing 8 to 10 songs available on the listener's \
                      platform, best matches first. Favor songs similar to the \
                      liked list and avoid anything similar to the disliked \
                      list.";

        let context_json = serde_json::to_string(context)
            .map_err(|e| ProviderError::InvalidResponse(format!("Context serialization: {}", e)))?;

        let user = format!(
            "The listener feels {}. Their context is: {}",
            emotion, context_json
        );

        let content = self.chat(system, user, None).await?;
        let payload: PlaylistPayload = parse_payload(&content)?;

        if payload.songs.is_empty() {
            warn!(emotion = %emotion, "Model returned an empty playlist");
        }

        Ok(payload.songs)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Connection(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            });
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse tags response: {}", e))
        })?;

        let model_exists = tags.models.iter().any(|m| m.name == self.model);
        if !model_exists {
            warn!(
                model = %self.model,
                available_models = ?tags.models.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "Configured model not found in Ollama"
            );
        }

        Ok(())
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

// Model output payloads

#[derive(Debug, Deserialize)]
struct EmotionPayload {
    emotion: String,
}

#[derive(Debug, Deserialize)]
struct EmotionConfidencePayload {
    emotion: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct PlaylistPayload {
    songs: Vec<Song>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_emotion_confidence_payload() {
        let payload: EmotionConfidencePayload =
            parse_payload(r#" {"emotion": "Happy", "confidence": 0.87} "#).unwrap();
        assert_eq!(payload.emotion, "Happy");
        assert!((payload.confidence - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_emotion_label_is_lenient_about_case() {
        assert_eq!(parse_emotion_label("energetic").unwrap(), Emotion::Energetic);
        assert!(parse_emotion_label("grumpy").is_err());
    }

    #[test]
    fn test_parse_playlist_payload() {
        let raw = r#"{"songs": [
            {"title": "Here Comes the Sun", "artist": "The Beatles", "album": "Abbey Road"},
            {"title": "Lovely Day", "artist": "Bill Withers"}
        ]}"#;
        let payload: PlaylistPayload = parse_payload(raw).unwrap();
        assert_eq!(payload.songs.len(), 2);
        assert_eq!(payload.songs[0].artist, "The Beatles");
        // album is optional in model output
        assert_eq!(payload.songs[1].album, "");
    }

    #[test]
    fn test_malformed_model_output_is_invalid_response() {
        let result: Result<PlaylistPayload, _> = parse_payload("here you go: 1. ...");
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_chat_request_serialization_omits_empty_fields() {
        let request = OllamaChatRequest {
            model: "llama3.1:8b".to_string(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
                images: None,
            }],
            stream: false,
            format: None,
            options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
        assert!(json["messages"][0].get("images").is_none());
    }
}
