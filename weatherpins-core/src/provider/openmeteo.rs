use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    config::DEFAULT_WEATHER_URL,
    error::{FetchError, truncate_body},
};

use super::WeatherProvider;

/// Open-Meteo forecast API client. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_WEATHER_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: Client::new() }
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current_weather: Option<OmCurrentWeather>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_temperature(&self, latitude: f64, longitude: f64) -> Result<f64, FetchError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(FetchError::InvalidCoordinates { latitude, longitude });
        }

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, "Open-Meteo request failed");
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        let parsed: OmResponse = serde_json::from_str(&body)?;

        let temperature = parsed
            .current_weather
            .and_then(|current| current.temperature)
            .ok_or(FetchError::MissingTemperature)?;

        tracing::debug!(temperature, "fetched current temperature");
        Ok(temperature)
    }
}
