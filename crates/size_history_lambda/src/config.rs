//! Environment-driven configuration shared by the Lambda binaries.

use std::time::Duration;

use size_history_core::contract::DEFAULT_HISTORY_TABLE;
use size_history_core::trend::DEFAULT_WINDOW_SECONDS;
use thiserror::Error;

pub const BUCKET_ENV: &str = "SIZE_HISTORY_BUCKET";
pub const TABLE_ENV: &str = "SIZE_HISTORY_TABLE";
pub const PLOTTING_API_URL_ENV: &str = "PLOTTING_API_URL";
pub const DRIVER_STEP_DELAY_ENV: &str = "DRIVER_STEP_DELAY_MS";
pub const PLOT_WINDOW_ENV: &str = "PLOT_WINDOW_SECONDS";

const DEFAULT_STEP_DELAY_MS: u64 = 1_500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub bucket: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConfig {
    pub store: StoreConfig,
    pub default_window_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverEnvConfig {
    pub bucket: String,
    pub plotting_api_url: String,
    pub step_delay: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bucket: required(lookup, BUCKET_ENV)?,
            table: lookup(TABLE_ENV)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HISTORY_TABLE.to_string()),
        })
    }
}

impl PlotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            store: StoreConfig::from_lookup(lookup)?,
            default_window_seconds: positive_or(lookup, PLOT_WINDOW_ENV, DEFAULT_WINDOW_SECONDS)?,
        })
    }
}

impl DriverEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let delay_ms = match lookup(DRIVER_STEP_DELAY_ENV) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: DRIVER_STEP_DELAY_ENV,
                    value,
                })?,
            None => DEFAULT_STEP_DELAY_MS,
        };
        Ok(Self {
            bucket: required(lookup, BUCKET_ENV)?,
            plotting_api_url: required(lookup, PLOTTING_API_URL_ENV)?,
            step_delay: Duration::from_millis(delay_ms),
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn positive_or(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn store_config_defaults_table_name() {
        let config = StoreConfig::from_lookup(&lookup_from(&[(BUCKET_ENV, "testbucket")]))
            .expect("config should load");
        assert_eq!(config.bucket, "testbucket");
        assert_eq!(config.table, DEFAULT_HISTORY_TABLE);
    }

    #[test]
    fn missing_bucket_is_reported_by_name() {
        let error = StoreConfig::from_lookup(&lookup_from(&[(BUCKET_ENV, "  ")]))
            .expect_err("blank bucket should fail");
        assert_eq!(error.to_string(), "SIZE_HISTORY_BUCKET must be configured");
    }

    #[test]
    fn plot_window_rejects_zero() {
        let error = PlotConfig::from_lookup(&lookup_from(&[
            (BUCKET_ENV, "testbucket"),
            (PLOT_WINDOW_ENV, "0"),
        ]))
        .expect_err("zero window should fail");
        assert!(matches!(error, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn driver_config_reads_delay_and_url() {
        let config = DriverEnvConfig::from_lookup(&lookup_from(&[
            (BUCKET_ENV, "testbucket"),
            (PLOTTING_API_URL_ENV, "https://example.execute-api.us-east-2.amazonaws.com/dev"),
            (DRIVER_STEP_DELAY_ENV, "0"),
        ]))
        .expect("config should load");
        assert_eq!(config.step_delay, Duration::ZERO);
        assert!(config.plotting_api_url.ends_with("/dev"));
    }

    #[test]
    fn driver_config_defaults_delay() {
        let config = DriverEnvConfig::from_lookup(&lookup_from(&[
            (BUCKET_ENV, "testbucket"),
            (PLOTTING_API_URL_ENV, "https://example.com/dev"),
        ]))
        .expect("config should load");
        assert_eq!(config.step_delay, Duration::from_millis(1_500));
    }
}
