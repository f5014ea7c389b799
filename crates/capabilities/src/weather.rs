use async_trait::async_trait;
use buddy_core::{CapabilityResult, DataOrigin, Error, Result};
use buddy_providers::{SyntheticWeather, WeatherProvider, WeatherReport};
use serde_json::{json, Value};
use tracing::warn;

use crate::{Capability, CapabilityContext, CapabilitySchema};

/// Comfortable temperature band for outdoor activities, in °C.
pub const COMFORT_BAND: (f64, f64) = (15.0, 28.0);
/// Suitability deduction when any precipitation is expected.
pub const PRECIPITATION_PENALTY: f64 = 0.4;
/// Suitability deduction per °C outside the comfort band.
pub const TEMPERATURE_PENALTY_PER_DEGREE: f64 = 0.05;

/// Outdoor suitability score in [0, 1].
///
/// Starts at 1.0, loses [`PRECIPITATION_PENALTY`] when precipitation is
/// flagged and [`TEMPERATURE_PENALTY_PER_DEGREE`] for every degree outside
/// [`COMFORT_BAND`], clamped to [0, 1].
pub fn outdoor_suitability(report: &WeatherReport) -> f64 {
    let mut score = 1.0;
    if report.precipitation {
        score -= PRECIPITATION_PENALTY;
    }
    let (low, high) = COMFORT_BAND;
    let temp = report.temperature_c;
    if temp < low {
        score -= (low - temp) * TEMPERATURE_PENALTY_PER_DEGREE;
    } else if temp > high {
        score -= (temp - high) * TEMPERATURE_PENALTY_PER_DEGREE;
    }
    score.clamp(0.0, 1.0)
}

pub fn suitability_rating(score: f64) -> &'static str {
    if score >= 0.8 {
        "excellent"
    } else if score >= 0.6 {
        "good"
    } else if score >= 0.4 {
        "fair"
    } else if score >= 0.2 {
        "poor"
    } else {
        "unsuitable"
    }
}

/// Human findings explaining each deduction.
pub fn weather_findings(report: &WeatherReport) -> Vec<String> {
    let mut findings = Vec::new();
    if report.precipitation {
        findings.push(format!("precipitation expected ({})", report.condition));
    }
    let (low, high) = COMFORT_BAND;
    if report.temperature_c < low {
        findings.push(format!("cold: {:.0}°C is below the comfortable band", report.temperature_c));
    } else if report.temperature_c > high {
        findings.push(format!("hot: {:.0}°C is above the comfortable band", report.temperature_c));
    }
    findings
}

pub fn weather_recommendations(report: &WeatherReport, score: f64) -> Vec<String> {
    let mut recommendations = Vec::new();
    if report.precipitation {
        recommendations.push("Bring an umbrella or raincoat".to_string());
        recommendations.push("Consider rescheduling outdoor events".to_string());
    }
    if report.temperature_c > 30.0 {
        recommendations.push("Stay hydrated and seek shade".to_string());
    } else if report.temperature_c < 5.0 {
        recommendations.push("Dress warmly with layers".to_string());
    }
    if score < 0.5 {
        recommendations.push("Consider indoor alternatives".to_string());
    }
    recommendations
}

/// Weather lookup with outdoor-impact analysis attached to the payload.
#[derive(Debug)]
pub struct WeatherCapability;

impl WeatherCapability {
    async fn fetch(&self, ctx: &CapabilityContext, city: &str) -> Result<WeatherReport> {
        match ctx.weather.current(city).await {
            Ok(report) => Ok(report),
            Err(Error::ProviderUnavailable(reason)) => {
                // Degrade, never fail: an unreachable provider still yields a
                // successful, clearly-synthetic result.
                warn!(city, reason, "Weather provider unavailable, degrading to synthetic data");
                SyntheticWeather.current(city).await
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Capability for WeatherCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "weather",
            description: "Get current weather for a city and analyze its impact on outdoor activities.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name. Defaults to the configured default city."
                    }
                },
                "required": []
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        if let Some(city) = params.get("city") {
            if !city.is_string() {
                return Err(Error::Validation("Parameter 'city' must be a string".to_string()));
            }
        }
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<CapabilityResult> {
        let city = params
            .get("city")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&ctx.config.agent.default_city)
            .to_string();

        let report = self.fetch(&ctx, &city).await?;
        let score = outdoor_suitability(&report);
        let rating = suitability_rating(score);
        let recommendations = weather_recommendations(&report, score);

        let mut message = format!(
            "Weather in {}: {:.0}°C (feels like {:.0}°C), {}, humidity {}%. Outdoor suitability: {} ({:.0}%).",
            report.city,
            report.temperature_c,
            report.feels_like_c,
            report.condition,
            report.humidity,
            rating,
            score * 100.0,
        );
        if report.origin == DataOrigin::Synthetic {
            message.push_str(" (simulated data; configure WEATHER_API_KEY for live conditions)");
        }

        Ok(CapabilityResult::ok_with_data(
            message,
            json!({
                "city": report.city,
                "temperature_c": report.temperature_c,
                "feels_like_c": report.feels_like_c,
                "humidity": report.humidity,
                "condition": report.condition,
                "precipitation": report.precipitation,
                "wind_speed": report.wind_speed,
                "origin": report.origin,
                "impact": {
                    "outdoor_suitability": score,
                    "rating": rating,
                    "findings": weather_findings(&report),
                    "recommendations": recommendations,
                }
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_core::Config;
    use std::sync::Arc;

    fn report(temperature_c: f64, precipitation: bool) -> WeatherReport {
        WeatherReport {
            city: "Testville".to_string(),
            temperature_c,
            feels_like_c: temperature_c,
            humidity: 50,
            condition: if precipitation { "rain" } else { "clear sky" }.to_string(),
            precipitation,
            wind_speed: 3.0,
            origin: DataOrigin::Live,
        }
    }

    #[test]
    fn test_suitability_comfortable_dry() {
        assert!((outdoor_suitability(&report(22.0, false)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_suitability_comfortable_wet() {
        assert!((outdoor_suitability(&report(22.0, true)) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_suitability_hot_dry_proportional() {
        let score = outdoor_suitability(&report(35.0, false));
        assert!((score - 0.65).abs() < 1e-9);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_suitability_clamped_at_zero() {
        // freezing downpour: 1.0 - 0.4 - 20*0.05 would be negative
        assert_eq!(outdoor_suitability(&report(-5.0, true)), 0.0);
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(suitability_rating(1.0), "excellent");
        assert_eq!(suitability_rating(0.6), "good");
        assert_eq!(suitability_rating(0.45), "fair");
        assert_eq!(suitability_rating(0.25), "poor");
        assert_eq!(suitability_rating(0.1), "unsuitable");
    }

    struct FailingWeather;

    #[async_trait]
    impl WeatherProvider for FailingWeather {
        async fn current(&self, _location: &str) -> Result<WeatherReport> {
            Err(Error::ProviderUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_degrades_to_synthetic() {
        let mut ctx = CapabilityContext::synthetic(Config::default());
        ctx.weather = Arc::new(FailingWeather);

        let result = WeatherCapability
            .execute(ctx, serde_json::json!({"city": "Paris"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.is_synthetic());
    }

    #[tokio::test]
    async fn test_default_city_from_config() {
        let mut config = Config::default();
        config.agent.default_city = "Oslo".to_string();
        let ctx = CapabilityContext::synthetic(config);

        let result = WeatherCapability
            .execute(ctx, serde_json::json!({}))
            .await
            .unwrap();
        assert!(result.message.contains("Oslo"));
    }
}
