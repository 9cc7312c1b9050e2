//! Runtime configuration, read from the environment once at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use despensa_ai::openrouter::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use despensa_ai::{DEFAULT_MAX_RESPONSE_BYTES, OpenRouterConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ITEMS_PER_PAGE: usize = 5;
pub const DEFAULT_HISTORY_RECORDS_PER_ITEM: usize = 10;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// SQLite URL; `None` keeps everything in memory.
    pub database_url: Option<String>,
    pub model: OpenRouterConfig,
    pub max_model_response_bytes: usize,
    pub items_per_page: usize,
    pub history_records_per_item: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            model: OpenRouterConfig::default(),
            max_model_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            history_records_per_item: DEFAULT_HISTORY_RECORDS_PER_ITEM,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENROUTER_API_KEY").unwrap_or_else(|| {
            tracing::warn!("OPENROUTER_API_KEY not set; model calls will be rejected upstream");
            String::new()
        });

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set; inventory is kept in memory only");
        }

        let timeout_secs: u64 = parse_or(
            "MODEL_TIMEOUT_SECS",
            get("MODEL_TIMEOUT_SECS"),
            DEFAULT_MODEL_TIMEOUT_SECS,
        )?;

        Ok(Self {
            bind_addr: parse_or(
                "BIND_ADDR",
                get("BIND_ADDR"),
                SocketAddr::from(([0, 0, 0, 0], 8080)),
            )?,
            database_url,
            model: OpenRouterConfig {
                api_key,
                model: get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                endpoint: get("OPENROUTER_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            max_model_response_bytes: parse_positive(
                "MAX_MODEL_RESPONSE_BYTES",
                get("MAX_MODEL_RESPONSE_BYTES"),
                DEFAULT_MAX_RESPONSE_BYTES,
            )?,
            items_per_page: parse_positive(
                "ITEMS_PER_PAGE",
                get("ITEMS_PER_PAGE"),
                DEFAULT_ITEMS_PER_PAGE,
            )?,
            history_records_per_item: parse_positive(
                "HISTORY_RECORDS_PER_ITEM",
                get("HISTORY_RECORDS_PER_ITEM"),
                DEFAULT_HISTORY_RECORDS_PER_ITEM,
            )?,
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_positive(
    var: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    let parsed = parse_or(var, value, default)?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
