use buddy_core::Config;
use std::sync::Arc;
use tracing::info;

use crate::{
    MemoryCalendar, MessagingProvider, OpenWeatherProvider, PreviewMessaging,
    SmtpMessagingProvider, SyntheticWeather, WeatherProvider,
};

/// Resolve the weather provider from config. Unconfigured credentials select
/// the synthetic fallback instead of failing.
pub fn weather_provider(config: &Config) -> Arc<dyn WeatherProvider> {
    match config.providers.weather.resolved_api_key() {
        Some(api_key) => {
            match OpenWeatherProvider::new(&config.providers.weather.api_base, &api_key) {
                Ok(provider) => Arc::new(provider),
                Err(e) => {
                    info!(error = %e, "Weather client setup failed, using synthetic provider");
                    Arc::new(SyntheticWeather)
                }
            }
        }
        None => {
            info!("No weather API key configured, using synthetic provider");
            Arc::new(SyntheticWeather)
        }
    }
}

/// Calendar backing store. There is no external calendar credentialing in
/// this build; events live in process memory.
pub fn calendar_provider(_config: &Config) -> Arc<MemoryCalendar> {
    Arc::new(MemoryCalendar::new())
}

pub fn messaging_provider(config: &Config) -> Arc<dyn MessagingProvider> {
    let email = &config.providers.email;
    match email.resolved_credentials() {
        Some((username, password)) => Arc::new(SmtpMessagingProvider::new(
            &email.smtp_host,
            email.smtp_port,
            &username,
            &password,
            &email.from,
        )),
        None => {
            info!("No SMTP credentials configured, using preview messaging");
            Arc::new(PreviewMessaging)
        }
    }
}
