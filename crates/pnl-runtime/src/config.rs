#![forbid(unsafe_code)]

//! Environment-driven application configuration.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `PAYNETLINK_API_URL` | `api_url` | `/api` |
//! | `PAYNETLINK_DEV` | `is_dev` | `false` |
//! | `PAYNETLINK_SEARCH_DEBOUNCE_MS` | `search_debounce` | `0` |
//! | `PAYNETLINK_REQUEST_TIMEOUT_MS` | `request_timeout` | `15000` |
//! | `PAYNETLINK_LOG` | `log_filter` | `info` |
//!
//! Empty or whitespace-only values count as unset.

use std::fmt;
use std::time::Duration;

/// Prefix shared by every variable.
pub const ENV_PREFIX: &str = "PAYNETLINK_";

const DEFAULT_API_URL: &str = "/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    InvalidValue {
        /// Full variable name.
        var: String,
        /// The offending value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { var, value } => {
                write!(f, "invalid value for {var}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL for API requests.
    pub api_url: String,
    /// Development mode: enables missing-message warnings.
    pub is_dev: bool,
    /// Delay before auto-search fires after the query settles.
    pub search_debounce: Duration,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// `tracing` filter directives.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            is_dev: false,
            search_debounce: Duration::ZERO,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a full variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup: &lookup };
        let defaults = Self::default();
        Ok(Self {
            api_url: env.string("API_URL").unwrap_or(defaults.api_url),
            is_dev: env.flag("DEV")?.unwrap_or(defaults.is_dev),
            search_debounce: env
                .millis("SEARCH_DEBOUNCE_MS")?
                .unwrap_or(defaults.search_debounce),
            request_timeout: env
                .millis("REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
            log_filter: env.string("LOG").unwrap_or(defaults.log_filter),
        })
    }
}

struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn raw(&self, suffix: &str) -> Option<(String, String)> {
        let name = format!("{ENV_PREFIX}{suffix}");
        let value = (self.lookup)(&name)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some((name, trimmed.to_string()))
        }
    }

    fn string(&self, suffix: &str) -> Option<String> {
        self.raw(suffix).map(|(_, value)| value)
    }

    fn flag(&self, suffix: &str) -> Result<Option<bool>, ConfigError> {
        let Some((var, value)) = self.raw(suffix) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { var, value }),
        }
    }

    fn millis(&self, suffix: &str) -> Result<Option<Duration>, ConfigError> {
        let Some((var, value)) = self.raw(suffix) else {
            return Ok(None);
        };
        value
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidValue { var, value })
    }
}
