//! Runtime settings for the notify and call flows.
//!
//! Every field has a default, so an empty TOML document or an empty
//! environment both yield a working configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::{DispatcherConfig, DEFAULT_NOTIFY_MESSAGE};
use crate::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Sent when the visitor leaves the message blank.
    #[serde(default = "default_notify_message")]
    pub notify_message: String,

    /// Shown to the visitor after a successful notify.
    #[serde(default = "default_notify_success_message")]
    pub notify_success_message: String,

    /// Shown to the visitor when the rate limit is hit.
    #[serde(default = "default_rate_limit_message")]
    pub rate_limit_message: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Longest visitor message accepted, in characters.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Outbound request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_notify_message() -> String {
    DEFAULT_NOTIFY_MESSAGE.to_string()
}

fn default_notify_success_message() -> String {
    "通知已送达，请稍等片刻。".to_string()
}

fn default_rate_limit_message() -> String {
    "我正在赶来的路上,请稍等片刻~~~".to_string()
}

fn default_max_message_len() -> usize {
    200
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify_message: default_notify_message(),
            notify_success_message: default_notify_success_message(),
            rate_limit_message: default_rate_limit_message(),
            rate_limit: RateLimitConfig::default(),
            max_message_len: default_max_message_len(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Defaults overlaid with `NOTIFY_MESSAGE`, `NOTIFY_SUCCESS_MESSAGE`,
    /// `RATE_LIMIT_MESSAGE`, `RATE_LIMIT_WINDOW`, `RATE_LIMIT_MAX` and
    /// `NOTIFY_TIMEOUT`.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unparseable numbers are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("NOTIFY_MESSAGE") {
            self.notify_message = value;
        }
        if let Some(value) = lookup("NOTIFY_SUCCESS_MESSAGE") {
            self.notify_success_message = value;
        }
        if let Some(value) = lookup("RATE_LIMIT_MESSAGE") {
            self.rate_limit_message = value;
        }
        if let Some(value) = parse_var(&lookup, "RATE_LIMIT_WINDOW") {
            self.rate_limit.window_secs = value;
        }
        if let Some(value) = parse_var(&lookup, "RATE_LIMIT_MAX") {
            self.rate_limit.max_attempts = value;
        }
        if let Some(value) = parse_var(&lookup, "NOTIFY_TIMEOUT") {
            self.request_timeout_secs = value;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            default_message: self.notify_message.clone(),
            request_timeout: self.request_timeout(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
