pub mod calendar;
pub mod conversation;
pub mod email;
pub mod registry;
pub mod social;
pub mod weather;

use async_trait::async_trait;
use buddy_core::{CapabilityResult, Config, Result};
use buddy_providers::{CalendarProvider, MessagingProvider, WeatherProvider};
use serde_json::Value;
use std::sync::Arc;

pub use calendar::CalendarCapability;
pub use conversation::ConversationCapability;
pub use email::EmailCapability;
pub use registry::CapabilityRegistry;
pub use social::SocialCapability;
pub use weather::WeatherCapability;

/// Declared surface of a capability: unique name, human description, and a
/// JSON-schema-shaped parameter description.
pub struct CapabilitySchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Collaborator handles passed into every capability invocation. The core
/// never talks to a vendor API directly; everything external goes through
/// these provider seams.
#[derive(Clone)]
pub struct CapabilityContext {
    pub config: Config,
    pub weather: Arc<dyn WeatherProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub messaging: Arc<dyn MessagingProvider>,
}

impl CapabilityContext {
    pub fn new(
        config: Config,
        weather: Arc<dyn WeatherProvider>,
        calendar: Arc<dyn CalendarProvider>,
        messaging: Arc<dyn MessagingProvider>,
    ) -> Self {
        Self {
            config,
            weather,
            calendar,
            messaging,
        }
    }

    /// Context backed entirely by synthetic providers. Used by tests and the
    /// demo command; behaves exactly like a fully unconfigured install.
    pub fn synthetic(config: Config) -> Self {
        Self {
            config,
            weather: Arc::new(buddy_providers::SyntheticWeather),
            calendar: Arc::new(buddy_providers::MemoryCalendar::new()),
            messaging: Arc::new(buddy_providers::PreviewMessaging),
        }
    }
}

#[async_trait]
pub trait Capability: Send + Sync + std::fmt::Debug {
    fn schema(&self) -> CapabilitySchema;

    /// Check declared parameters before execution. A failure here becomes a
    /// structured validation result; the handler is never invoked.
    fn validate(&self, params: &Value) -> Result<()>;

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<CapabilityResult>;
}

/// Pull a required string parameter, or a `Validation` error naming it.
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            buddy_core::Error::Validation(format!("Missing required parameter: {}", key))
        })
}
