//! Open-Meteo weather provider implementation.

use super::{WeatherError, WeatherProvider};
use crate::model::Weather;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Weather provider backed by the Open-Meteo forecast API (no API key).
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            latitude,
            longitude,
        }
    }

    /// Override the API endpoint, for tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Map a WMO weather interpretation code to one of the four conditions the
/// recommendation context distinguishes.
pub(crate) fn weather_from_wmo_code(code: u16) -> Option<Weather> {
    match code {
        0 | 1 => Some(Weather::Sunny),
        2 | 3 | 45 | 48 => Some(Weather::Cloudy),
        51..=67 | 80..=82 | 95..=99 => Some(Weather::Rainy),
        71..=77 | 85 | 86 => Some(Weather::Snowy),
        _ => None,
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_by_location(&self) -> Result<Weather, WeatherError> {
        let url = format!(
            "{}?latitude={}&longitude={}&current_weather=true",
            self.base_url, self.latitude, self.longitude
        );

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| WeatherError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Api(response.status().as_u16()));
        }

        let body: ForecastResponse = response.json().await.map_err(|e| {
            WeatherError::InvalidResponse(format!("Failed to parse forecast response: {}", e))
        })?;

        let code = body.current_weather.weathercode;
        let weather = weather_from_wmo_code(code)
            .ok_or_else(|| WeatherError::InvalidResponse(format!("Unknown WMO code: {}", code)))?;

        debug!(code = code, weather = %weather, "Weather detected");
        Ok(weather)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    weathercode: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(weather_from_wmo_code(0), Some(Weather::Sunny));
        assert_eq!(weather_from_wmo_code(3), Some(Weather::Cloudy));
        assert_eq!(weather_from_wmo_code(45), Some(Weather::Cloudy));
        assert_eq!(weather_from_wmo_code(61), Some(Weather::Rainy));
        assert_eq!(weather_from_wmo_code(95), Some(Weather::Rainy));
        assert_eq!(weather_from_wmo_code(71), Some(Weather::Snowy));
        assert_eq!(weather_from_wmo_code(86), Some(Weather::Snowy));
        assert_eq!(weather_from_wmo_code(44), None);
    }

    #[test]
    fn test_forecast_response_parsing() {
        let raw = r#"{
            "latitude": 52.52,
            "longitude": 13.42,
            "current_weather": {"temperature": 14.2, "weathercode": 61, "windspeed": 8.4}
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.current_weather.weathercode, 61);
    }
}
