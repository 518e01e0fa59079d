use crate::{IngestError, WeatherReading, settings::WeatherSettings};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Upstream source of current weather readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the current reading for `city`. One attempt, no retry.
    async fn fetch_current(&self, api_key: &str, city: &str) -> Result<WeatherReading, IngestError>;
}

/// Construct the OpenWeather provider from settings.
pub fn provider_from_settings(settings: &WeatherSettings) -> anyhow::Result<OpenWeatherProvider> {
    let provider = OpenWeatherProvider::new(&settings.base_url, settings.timeout())?;
    Ok(provider)
}
