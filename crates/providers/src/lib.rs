pub mod factory;
pub mod openweather;
pub mod smtp;
pub mod synthetic;

use async_trait::async_trait;
use buddy_core::{DataOrigin, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use factory::{calendar_provider, messaging_provider, weather_provider};
pub use openweather::OpenWeatherProvider;
pub use smtp::SmtpMessagingProvider;
pub use synthetic::{MemoryCalendar, PreviewMessaging, SyntheticWeather};

/// Current conditions for one location, normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity: u8,
    pub condition: String,
    pub precipitation: bool,
    pub wind_speed: f64,
    pub origin: DataOrigin,
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The next `hours` hours starting now.
    pub fn next_hours(hours: i64) -> Self {
        let start = Utc::now();
        Self {
            start,
            end: start + Duration::hours(hours),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Overlap with another window, or `None` when disjoint.
    pub fn overlap(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(TimeWindow { start, end })
        } else {
            None
        }
    }

    /// Fraction of `other` covered by this window, in [0, 1].
    pub fn overlap_fraction(&self, other: &TimeWindow) -> f64 {
        let Some(overlap) = self.overlap(other) else {
            return 0.0;
        };
        let total = other.duration().num_seconds();
        if total <= 0 {
            // zero-length events count as fully covered when inside
            return 1.0;
        }
        overlap.duration().num_seconds() as f64 / total as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl CalendarEvent {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Request to create a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// Outgoing message for the messaging provider (email or social post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outgoing {
    pub target: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub target: String,
    pub delivered: bool,
    /// Rendered content when the transport is unconfigured and the message
    /// was only previewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub origin: DataOrigin,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn list_events(&self, window: TimeWindow) -> Result<Vec<CalendarEvent>>;
    async fn create_event(&self, spec: EventSpec) -> Result<String>;
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send(&self, outgoing: Outgoing) -> Result<DeliveryReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn test_window_overlap() {
        let a = TimeWindow::new(at(8), at(12));
        let b = TimeWindow::new(at(10), at(14));
        let overlap = a.overlap(&b).unwrap();
        assert_eq!(overlap.start, at(10));
        assert_eq!(overlap.end, at(12));

        let c = TimeWindow::new(at(13), at(15));
        assert!(a.overlap(&c).is_none());
    }

    #[test]
    fn test_overlap_fraction() {
        let day = TimeWindow::new(at(0), at(23));
        let event = TimeWindow::new(at(14), at(16));
        assert!((day.overlap_fraction(&event) - 1.0).abs() < f64::EPSILON);

        let half = TimeWindow::new(at(15), at(20));
        assert!((half.overlap_fraction(&event) - 0.5).abs() < 1e-9);

        let outside = TimeWindow::new(at(17), at(20));
        assert_eq!(outside.overlap_fraction(&event), 0.0);
    }

    #[test]
    fn test_window_contains() {
        let w = TimeWindow::new(at(8), at(12));
        assert!(w.contains(at(8)));
        assert!(w.contains(at(11)));
        assert!(!w.contains(at(12)));
    }
}
