use async_trait::async_trait;
use buddy_core::{DataOrigin, Error, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{WeatherProvider, WeatherReport};

/// OpenWeatherMap current-conditions client.
pub struct OpenWeatherProvider {
    client: Client,
    api_base: String,
    api_key: String,
}

impl OpenWeatherProvider {
    pub fn new(api_base: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::ProviderUnavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        let url = format!("{}/weather", self.api_base);
        debug!(city = location, "Fetching current weather");

        let response = self
            .client
            .get(&url)
            .query(&[("q", location), ("appid", &self.api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("Weather request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Unknown location: {}", location)));
        }
        if !response.status().is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "Weather service returned {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("Weather response parse error: {}", e)))?;

        parse_report(location, &data)
    }
}

fn parse_report(location: &str, data: &Value) -> Result<WeatherReport> {
    let main = data
        .get("main")
        .ok_or_else(|| Error::ProviderUnavailable("Weather payload missing 'main'".to_string()))?;
    let condition = data["weather"][0]["description"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();
    let lower = condition.to_lowercase();
    // `rain.1h` is only present during active precipitation
    let raining = data.get("rain").and_then(|r| r.get("1h")).is_some();

    Ok(WeatherReport {
        city: data["name"].as_str().unwrap_or(location).to_string(),
        temperature_c: main["temp"].as_f64().unwrap_or(0.0),
        feels_like_c: main["feels_like"].as_f64().unwrap_or(0.0),
        humidity: main["humidity"].as_u64().unwrap_or(0) as u8,
        precipitation: raining
            || lower.contains("rain")
            || lower.contains("snow")
            || lower.contains("drizzle")
            || lower.contains("storm"),
        condition,
        wind_speed: data["wind"]["speed"].as_f64().unwrap_or(0.0),
        origin: DataOrigin::Live,
    })
}
