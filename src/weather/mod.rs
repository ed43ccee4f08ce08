//! Weather lookup abstraction.
//!
//! Weather is a soft signal: a failed lookup downgrades the session to
//! manual weather selection with a surfaced notice, it never blocks an
//! analysis cycle.

mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

use crate::model::Weather;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {0})")]
    Api(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for weather providers.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the current weather for the configured location.
    async fn fetch_by_location(&self) -> Result<Weather, WeatherError>;
}
