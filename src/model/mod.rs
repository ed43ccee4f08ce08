//! Core domain types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of emotion labels the inference provider may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Excited,
    Neutral,
    Calm,
    Content,
    Energetic,
    Thoughtful,
}

impl Emotion {
    pub const ALL: [Emotion; 11] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Excited,
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Content,
        Emotion::Energetic,
        Emotion::Thoughtful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Fear => "Fear",
            Emotion::Surprise => "Surprise",
            Emotion::Excited => "Excited",
            Emotion::Neutral => "Neutral",
            Emotion::Calm => "Calm",
            Emotion::Content => "Content",
            Emotion::Energetic => "Energetic",
            Emotion::Thoughtful => "Thoughtful",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown emotion label: {0}")]
pub struct ParseEmotionError(String);

impl FromStr for Emotion {
    type Err = ParseEmotionError;

    /// Case-insensitive: provider output is model-generated free text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEmotionError(trimmed.to_string()))
    }
}

/// A recommended track. Identity is (title, artist), exact and
/// case-sensitive; album is display-only metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
}

impl Song {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }

    /// Whether two songs refer to the same track.
    pub fn same_track(&self, other: &Song) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Like,
    Dislike,
}

/// Durable record of like/dislike actions on recommended songs.
///
/// Invariants: a song appears in at most one of the two lists, and never
/// twice within a list (by track identity).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackHistory {
    #[serde(default)]
    pub liked: Vec<Song>,
    #[serde(default)]
    pub disliked: Vec<Song>,
}

impl FeedbackHistory {
    /// Apply a like/dislike action.
    ///
    /// The song is removed from the opposite list unconditionally, then its
    /// membership in the target list is toggled: a repeated action on the
    /// same track withdraws the feedback.
    pub fn record(&mut self, song: Song, kind: FeedbackKind) {
        let (target, opposite) = match kind {
            FeedbackKind::Like => (&mut self.liked, &mut self.disliked),
            FeedbackKind::Dislike => (&mut self.disliked, &mut self.liked),
        };
        opposite.retain(|s| !s.same_track(&song));
        if let Some(pos) = target.iter().position(|s| s.same_track(&song)) {
            target.remove(pos);
        } else {
            target.push(song);
        }
    }

    pub fn clear(&mut self) {
        self.liked.clear();
        self.disliked.clear();
    }

    pub fn is_liked(&self, song: &Song) -> bool {
        self.liked.iter().any(|s| s.same_track(song))
    }

    pub fn is_disliked(&self, song: &Song) -> bool {
        self.disliked.iter().any(|s| s.same_track(song))
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }
}

/// Streaming platform the playlist is generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    Spotify,
    #[serde(rename = "YouTube Music")]
    YouTubeMusic,
    #[serde(rename = "Apple Music")]
    AppleMusic,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Spotify, Platform::YouTubeMusic, Platform::AppleMusic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::YouTubeMusic => "YouTube Music",
            Platform::AppleMusic => "Apple Music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "youtube" | "youtube music" | "youtube-music" => Ok(Platform::YouTubeMusic),
            "apple" | "apple music" | "apple-music" => Ok(Platform::AppleMusic),
            other => Err(ParsePlatformError(other.to_string())),
        }
    }
}

/// Current weather condition, reduced to the four values the
/// recommendation prompt distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Weather::Sunny, Weather::Cloudy, Weather::Rainy, Weather::Snowy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Sunny => "Sunny",
            Weather::Cloudy => "Cloudy",
            Weather::Rainy => "Rainy",
            Weather::Snowy => "Snowy",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown weather condition: {0}")]
pub struct ParseWeatherError(String);

impl FromStr for Weather {
    type Err = ParseWeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Weather::ALL
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseWeatherError(trimmed.to_string()))
    }
}

/// Whether the current weather value came from the provider or was picked
/// by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherSource {
    Auto,
    Manual,
}

/// Coarse time-of-day bucket derived from the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Bucket a 24h clock hour: before noon is Morning, noon up to 18 is
    /// Afternoon, the rest is Evening.
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else if hour < 18 {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }

    pub fn now() -> Self {
        use chrono::Timelike;
        Self::from_hour(chrono::Local::now().hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emotion reading produced by the classifier, with the provider's
/// certainty for camera input or the fixed per-modality value otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionReading {
    pub emotion: Emotion,
    pub confidence: f32,
}
