//! RelayConfig - Config Loader output
//!
//! Monitoring-API endpoint, credentials, schedule and the optional webhook.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lower bound for the snapshot push interval (seconds)
pub const MIN_PUSH_INTERVAL_SECS: u64 = 10;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Structured monitoring backend
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Generic event webhook (optional)
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Monitoring-API settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorConfig {
    /// Base URL, e.g. "https://monitor.example.com"
    #[serde(default)]
    #[validate(url(message = "must be a valid URL"))]
    pub base_url: String,

    /// Shared secret sent as `X-API-Key`
    #[serde(default)]
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub api_key: String,

    /// Server identifier on the monitoring backend, must be > 0
    #[serde(default)]
    #[validate(range(min = 1, message = "must be > 0"))]
    pub server_id: i64,

    /// Path segment of the API (`/api/v1/<game>/...`)
    #[serde(default = "default_game")]
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub game: String,

    /// Snapshot push interval in seconds (clamped to >= 10)
    #[serde(default = "default_push_interval")]
    pub push_interval_secs: u64,
}

fn default_game() -> String {
    "vrising".to_string()
}

fn default_push_interval() -> u64 {
    60
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            server_id: 0,
            game: default_game(),
            push_interval_secs: default_push_interval(),
        }
    }
}

impl MonitorConfig {
    /// Effective push interval, clamped up to the minimum
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs.max(MIN_PUSH_INTERVAL_SECS))
    }

    /// Base URL without trailing slashes
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `<base>/api/v1/<game>/events`
    pub fn events_url(&self) -> String {
        format!("{}/api/v1/{}/events", self.base_url_trimmed(), self.game)
    }

    /// `<base>/api/v1/<game>/push`
    pub fn push_url(&self) -> String {
        format!("{}/api/v1/{}/push", self.base_url_trimmed(), self.game)
    }
}

/// Webhook settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Blank means not configured
    #[serde(default)]
    pub url: String,
}

impl RelayConfig {
    /// Webhook URL if one is configured
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook
            .as_ref()
            .map(|w| w.url.trim())
            .filter(|url| !url.is_empty())
    }
}
