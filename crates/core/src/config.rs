use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefaults {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Per-capability execution budget.
    #[serde(default = "default_capability_timeout_ms")]
    pub capability_timeout_ms: u64,
    /// Per-evaluator budget within one fusion cycle.
    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,
    /// Bound on in-memory intent/decision history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_name() -> String {
    "Buddy".to_string()
}

fn default_city() -> String {
    std::env::var("DEFAULT_CITY").unwrap_or_else(|_| "New York".to_string())
}

fn default_capability_timeout_ms() -> u64 {
    15_000
}

fn default_evaluator_timeout_ms() -> u64 {
    10_000
}

fn default_history_limit() -> usize {
    50
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            name: default_name(),
            default_city: default_city(),
            capability_timeout_ms: default_capability_timeout_ms(),
            evaluator_timeout_ms: default_evaluator_timeout_ms(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeatherProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_api_base")]
    pub api_base: String,
}

fn default_weather_api_base() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

impl WeatherProviderConfig {
    /// Key from config, falling back to the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailProviderConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailProviderConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
        }
    }
}

impl EmailProviderConfig {
    pub fn resolved_credentials(&self) -> Option<(String, String)> {
        let username = if !self.username.is_empty() {
            self.username.clone()
        } else {
            std::env::var("GMAIL_EMAIL").ok().filter(|v| !v.is_empty())?
        };
        let password = if !self.password.is_empty() {
            self.password.clone()
        } else {
            std::env::var("GMAIL_APP_PASSWORD").ok().filter(|v| !v.is_empty())?
        };
        Some((username, password))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SocialProviderConfig {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub bearer_token: String,
}

impl SocialProviderConfig {
    pub fn resolved_token(&self) -> Option<String> {
        if !self.bearer_token.is_empty() {
            return Some(self.bearer_token.clone());
        }
        std::env::var("X_BEARER_TOKEN").ok().filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default)]
    pub weather: WeatherProviderConfig,
    #[serde(default)]
    pub email: EmailProviderConfig,
    #[serde(default)]
    pub social: SocialProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub agent: AgentDefaults,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Load from the default location, falling back to built-in defaults when
    /// no config file exists. Missing credentials are not an error; they
    /// select synthetic providers downstream.
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "Failed to load config, using defaults");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".buddy").join("config.yaml"))
    }
}
