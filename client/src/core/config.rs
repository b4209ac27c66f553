//! # Client Configuration
//!
//! Configuration loaded from environment variables and validated on startup
//! to fail fast if misconfigured.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TIERTREFF_API_BASE` | `http://localhost:8080` |
//! | `TIERTREFF_AVATAR_PREFIX` | `/assets/` |
//! | `TIERTREFF_WS_PATH` | `/ws/websocket` |
//! | `TIERTREFF_POLL_INTERVAL_MS` | `10000` |
//! | `TIERTREFF_RECONNECT_DELAY_MS` | `3000` |
//! | `TIERTREFF_ACTOR_CACHE_CAPACITY` | `200` |
//! | `TIERTREFF_HTTP_TIMEOUT_SECS` | `10` |
//!
//! Use [`init_config()`] once at startup and [`config()`] afterwards, or pass a
//! [`Config`] explicitly (tests do the latter).

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use super::error::{AppError, Result};

/// Sync client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST API, without trailing slash.
    pub api_base: String,
    /// Prefix prepended to bare avatar file names.
    pub avatar_prefix: String,
    /// Path of the broker's raw WebSocket endpoint.
    pub ws_path: String,
    /// Interval between notification polls.
    pub poll_interval: Duration,
    /// Fixed delay before every reconnect attempt.
    pub reconnect_delay: Duration,
    /// Maximum number of cached actors.
    pub actor_cache_capacity: usize,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            avatar_prefix: "/assets/".to_string(),
            ws_path: "/ws/websocket".to_string(),
            poll_interval: Duration::from_millis(10_000),
            reconnect_delay: Duration::from_millis(3_000),
            actor_cache_capacity: 200,
            http_timeout: Duration::from_secs(10),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number, got '{}'", name, raw))),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            api_base: env_or("TIERTREFF_API_BASE", &defaults.api_base)
                .trim_end_matches('/')
                .to_string(),
            avatar_prefix: env_or("TIERTREFF_AVATAR_PREFIX", &defaults.avatar_prefix),
            ws_path: env_or("TIERTREFF_WS_PATH", &defaults.ws_path),
            poll_interval: Duration::from_millis(env_parse("TIERTREFF_POLL_INTERVAL_MS", 10_000u64)?),
            reconnect_delay: Duration::from_millis(env_parse("TIERTREFF_RECONNECT_DELAY_MS", 3_000u64)?),
            actor_cache_capacity: env_parse("TIERTREFF_ACTOR_CACHE_CAPACITY", defaults.actor_cache_capacity)?,
            http_timeout: Duration::from_secs(env_parse("TIERTREFF_HTTP_TIMEOUT_SECS", 10u64)?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "TIERTREFF_API_BASE must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(AppError::Config("TIERTREFF_POLL_INTERVAL_MS must be greater than 0".to_string()));
        }
        if self.reconnect_delay.is_zero() {
            return Err(AppError::Config("TIERTREFF_RECONNECT_DELAY_MS must be greater than 0".to_string()));
        }
        if self.actor_cache_capacity == 0 {
            return Err(AppError::Config("TIERTREFF_ACTOR_CACHE_CAPACITY must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Join a path onto the API base.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// WebSocket URL of the broker endpoint.
    pub fn ws_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        let scheme_swapped = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", scheme_swapped, self.ws_path)
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load, validate and install the global configuration.
///
/// Calling it again returns the configuration installed first.
pub fn init_config() -> Result<&'static Config> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let loaded = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| loaded))
}

/// The global configuration, or defaults when [`init_config()`] was never called.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(config.actor_cache_capacity, 200);
    }

    #[test]
    fn test_ws_url_derivation() {
        let mut config = Config::default();
        assert_eq!(config.ws_url(), "ws://localhost:8080/ws/websocket");

        config.api_base = "https://api.tiertreff.de/".to_string();
        assert_eq!(config.ws_url(), "wss://api.tiertreff.de/ws/websocket");
        assert_eq!(config.url("/auth/me"), "https://api.tiertreff.de/auth/me");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = Config {
            api_base: "localhost:8080".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            actor_cache_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
