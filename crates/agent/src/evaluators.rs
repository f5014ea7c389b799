use async_trait::async_trait;
use buddy_capabilities::weather::{outdoor_suitability, weather_findings};
use buddy_core::{Config, DataOrigin, Error, Result};
use buddy_providers::{CalendarProvider, SyntheticWeather, TimeWindow, WeatherProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Event vocabulary that marks a calendar entry as weather-sensitive.
pub const OUTDOOR_KEYWORDS: [&str; 10] = [
    "park", "outdoor", "picnic", "sports", "garden", "beach", "hiking", "walk", "jog", "run",
];

/// The request snapshot every specialist scores against. Built once per
/// fusion cycle by the caller; evaluators never share mutable state.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub text: String,
    pub city: String,
    pub window: TimeWindow,
}

/// One specialist's normalized verdict: a suitability/impact score in [0, 1]
/// plus the findings behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub source: String,
    pub score: f64,
    pub findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    pub origin: DataOrigin,
}

impl Assessment {
    /// Neutral stand-in for a specialist that timed out or failed. Scored
    /// 0.5 and flagged synthetic so fusion discounts it.
    pub fn degraded(source: &str, reason: &str) -> Self {
        Self {
            source: source.to_string(),
            score: 0.5,
            findings: vec![format!("assessment degraded: {}", reason)],
            raw: None,
            origin: DataOrigin::Synthetic,
        }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score one dimension of the request. Must complete even on degraded
    /// provider data; provider unavailability is not an excuse to fail.
    async fn assess(&self, request: &EvalRequest) -> Result<Assessment>;
}

/// Scores outdoor suitability of current conditions in the request city.
pub struct WeatherEvaluator {
    weather: Arc<dyn WeatherProvider>,
}

impl WeatherEvaluator {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self { weather }
    }
}

#[async_trait]
impl Evaluator for WeatherEvaluator {
    fn name(&self) -> &'static str {
        "weather"
    }

    async fn assess(&self, request: &EvalRequest) -> Result<Assessment> {
        let report = match self.weather.current(&request.city).await {
            Ok(report) => report,
            Err(Error::ProviderUnavailable(reason)) => {
                warn!(city = %request.city, reason, "Weather evaluator degrading to synthetic data");
                SyntheticWeather.current(&request.city).await?
            }
            Err(e) => return Err(e),
        };

        let score = outdoor_suitability(&report);
        let mut findings = weather_findings(&report);
        if findings.is_empty() {
            findings.push(format!(
                "conditions look good: {:.0}°C, {}",
                report.temperature_c, report.condition
            ));
        }

        Ok(Assessment {
            source: self.name().to_string(),
            score,
            findings,
            raw: Some(json!({
                "city": report.city,
                "temperature_c": report.temperature_c,
                "condition": report.condition,
                "precipitation": report.precipitation,
            })),
            origin: report.origin,
        })
    }
}

/// Scores how busy the request window is and flags outdoor events for
/// conflict detection.
pub struct ScheduleEvaluator {
    calendar: Arc<dyn CalendarProvider>,
}

impl ScheduleEvaluator {
    pub fn new(calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { calendar }
    }
}

pub fn is_outdoor_event(title: &str, description: &str) -> bool {
    let text = format!("{} {}", title, description).to_lowercase();
    OUTDOOR_KEYWORDS.iter().any(|kw| text.contains(kw))
}

#[async_trait]
impl Evaluator for ScheduleEvaluator {
    fn name(&self) -> &'static str {
        "schedule"
    }

    async fn assess(&self, request: &EvalRequest) -> Result<Assessment> {
        let events = self.calendar.list_events(request.window).await?;

        // each booked slot eats into schedule flexibility
        let score = (1.0 - 0.15 * events.len() as f64).max(0.2);

        let mut findings = Vec::new();
        let mut raw_events = Vec::new();
        for event in &events {
            let outdoor = is_outdoor_event(&event.title, &event.description);
            findings.push(format!(
                "{} at {}{}",
                event.title,
                event.start.to_rfc3339(),
                if outdoor { " (outdoor)" } else { "" }
            ));
            raw_events.push(json!({
                "title": event.title,
                "start": event.start.to_rfc3339(),
                "end": event.end.to_rfc3339(),
                "location": event.location,
                "outdoor": outdoor,
            }));
        }
        if findings.is_empty() {
            findings.push("no events in the window".to_string());
        }

        Ok(Assessment {
            source: self.name().to_string(),
            score,
            findings,
            raw: Some(json!({"events": raw_events})),
            origin: DataOrigin::Live,
        })
    }
}

/// Wraps the social trends digest into a neutral assessment. Carries no
/// suitability signal of its own; exists so social context reaches the fused
/// decision alongside weather and schedule.
pub struct SocialEvaluator {
    config: Config,
}

impl SocialEvaluator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Evaluator for SocialEvaluator {
    fn name(&self) -> &'static str {
        "social"
    }

    async fn assess(&self, _request: &EvalRequest) -> Result<Assessment> {
        let configured = self.config.providers.social.resolved_token().is_some();
        let trends = buddy_capabilities::social::FALLBACK_TRENDS;
        Ok(Assessment {
            source: self.name().to_string(),
            score: 0.5,
            findings: trends.iter().map(|t| format!("trending: {}", t)).collect(),
            raw: Some(json!({"trends": trends})),
            origin: if configured { DataOrigin::Live } else { DataOrigin::Synthetic },
        })
    }
}
