use crate::{Config, error::FetchError, provider::openmeteo::OpenMeteoProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openmeteo;

/// Source of current temperatures for a coordinate pair.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current temperature in degrees Celsius at the given coordinates.
    async fn fetch_temperature(&self, latitude: f64, longitude: f64) -> Result<f64, FetchError>;
}

/// Construct the weather provider described by config.
pub fn provider_from_config(config: &Config) -> Arc<dyn WeatherProvider> {
    Arc::new(OpenMeteoProvider::with_base_url(config.weather.base_url.clone()))
}
