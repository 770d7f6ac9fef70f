use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::retry::RetryConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::PoolSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_attempts: u32,
    pub connect_backoff_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: Duration::from_secs(30),
            retry: RetryConfig::new(
                self.connect_attempts,
                Duration::from_secs(self.connect_backoff_secs),
            ),
        }
    }
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(SubscriptionConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("subscription-service"))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            database: DatabaseConfig {
                url: Secret::new(get_env("DATABASE_URL", None)?),
                max_connections: get_parsed("DATABASE_MAX_CONNECTIONS", "10")?,
                min_connections: get_parsed("DATABASE_MIN_CONNECTIONS", "1")?,
                connect_attempts: get_parsed("DATABASE_CONNECT_ATTEMPTS", "5")?,
                connect_backoff_secs: get_parsed("DATABASE_CONNECT_BACKOFF_SECS", "1")?,
            },
            request_timeout_secs: get_parsed("REQUEST_TIMEOUT_SECS", "30")?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    lookup(key, default, |k| env::var(k).ok())
}

fn get_parsed<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env(key, Some(default))?)
}

fn lookup(
    key: &str,
    default: Option<&str>,
    source: impl Fn(&str) -> Option<String>,
) -> Result<String, AppError> {
    match source(key).filter(|v| !v.is_empty()) {
        Some(val) => Ok(val),
        None => default.map(str::to_string).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(format!("{} is required but not set", key)))
        }),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!(format!("{} is invalid: {}", key, e)))
    })
}
