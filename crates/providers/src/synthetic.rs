use async_trait::async_trait;
use buddy_core::{DataOrigin, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    CalendarEvent, CalendarProvider, DeliveryReceipt, EventSpec, MessagingProvider, Outgoing,
    TimeWindow, WeatherProvider, WeatherReport,
};

/// Fallback weather source used when no API key is configured.
///
/// Returns the same fixed, plausible report every time so repeated
/// invocations stay idempotent and tests are deterministic.
pub struct SyntheticWeather;

#[async_trait]
impl WeatherProvider for SyntheticWeather {
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        debug!(city = location, "Weather provider unconfigured, returning synthetic report");
        Ok(WeatherReport {
            city: titlecase(location),
            temperature_c: 22.0,
            feels_like_c: 22.0,
            humidity: 45,
            condition: "clear sky".to_string(),
            precipitation: false,
            wind_speed: 2.5,
            origin: DataOrigin::Synthetic,
        })
    }
}

fn titlecase(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory calendar store. Events live for the process lifetime only.
#[derive(Clone, Default)]
pub struct MemoryCalendar {
    events: Arc<Mutex<Vec<CalendarEvent>>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event directly, bypassing the provider contract. Used by the
    /// demo command and tests.
    pub async fn seed(&self, spec: EventSpec) -> String {
        self.insert(spec).await
    }

    async fn insert(&self, spec: EventSpec) -> String {
        let mut events = self.events.lock().await;
        let id = format!("event-{}", events.len() + 1);
        events.push(CalendarEvent {
            id: id.clone(),
            title: spec.title,
            start: spec.start,
            end: spec.end,
            location: spec.location,
            description: spec.description,
        });
        id
    }
}

#[async_trait]
impl CalendarProvider for MemoryCalendar {
    async fn list_events(&self, window: TimeWindow) -> Result<Vec<CalendarEvent>> {
        let events = self.events.lock().await;
        let mut matching: Vec<CalendarEvent> = events
            .iter()
            .filter(|e| window.overlap(&e.window()).is_some())
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.start);
        Ok(matching)
    }

    async fn create_event(&self, spec: EventSpec) -> Result<String> {
        Ok(self.insert(spec).await)
    }
}

/// Messaging fallback: renders the message instead of delivering it.
pub struct PreviewMessaging;

#[async_trait]
impl MessagingProvider for PreviewMessaging {
    async fn send(&self, outgoing: Outgoing) -> Result<DeliveryReceipt> {
        debug!(to = %outgoing.target, "Messaging provider unconfigured, returning preview");
        let preview = format!(
            "To: {}\nSubject: {}\n\n{}",
            outgoing.target, outgoing.subject, outgoing.body
        );
        Ok(DeliveryReceipt {
            target: outgoing.target,
            delivered: false,
            preview: Some(preview),
            origin: DataOrigin::Synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn test_synthetic_weather_is_flagged_and_stable() {
        let provider = SyntheticWeather;
        let a = provider.current("new york").await.unwrap();
        let b = provider.current("new york").await.unwrap();
        assert_eq!(a.origin, DataOrigin::Synthetic);
        assert_eq!(a.city, "New York");
        assert_eq!(a.temperature_c, b.temperature_c);
        assert_eq!(a.condition, b.condition);
    }

    #[tokio::test]
    async fn test_memory_calendar_filters_and_sorts() {
        let calendar = MemoryCalendar::new();
        let base = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();

        calendar
            .create_event(EventSpec {
                title: "Late standup".to_string(),
                start: base + Duration::hours(3),
                end: base + Duration::hours(4),
                location: String::new(),
                description: String::new(),
            })
            .await
            .unwrap();
        calendar
            .create_event(EventSpec {
                title: "Early standup".to_string(),
                start: base,
                end: base + Duration::hours(1),
                location: String::new(),
                description: String::new(),
            })
            .await
            .unwrap();
        calendar
            .create_event(EventSpec {
                title: "Next week".to_string(),
                start: base + Duration::days(8),
                end: base + Duration::days(8) + Duration::hours(1),
                location: String::new(),
                description: String::new(),
            })
            .await
            .unwrap();

        let window = TimeWindow::new(base - Duration::hours(1), base + Duration::hours(24));
        let events = calendar.list_events(window).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Early standup");
        assert_eq!(events[1].title, "Late standup");
    }

    #[tokio::test]
    async fn test_preview_messaging_not_delivered() {
        let provider = PreviewMessaging;
        let receipt = provider
            .send(Outgoing {
                target: "john@example.com".to_string(),
                subject: "Weather alert".to_string(),
                body: "Rain expected".to_string(),
            })
            .await
            .unwrap();
        assert!(!receipt.delivered);
        assert_eq!(receipt.origin, DataOrigin::Synthetic);
        assert!(receipt.preview.unwrap().contains("john@example.com"));
    }
}
