use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::MatchPolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_radius_miles")]
    pub default_radius_miles: f64,
    #[serde(default = "default_max_radius_miles")]
    pub max_radius_miles: f64,
    #[serde(default = "default_recency_window_days")]
    pub recency_window_days: i64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_radius_miles: default_radius_miles(),
            max_radius_miles: default_max_radius_miles(),
            recency_window_days: default_recency_window_days(),
        }
    }
}

impl MatchingSettings {
    /// Build the matcher policy, rejecting values the matcher cannot work with
    pub fn policy(&self) -> Result<MatchPolicy, ConfigError> {
        if !(self.max_radius_miles.is_finite() && self.max_radius_miles > 0.0) {
            return Err(ConfigError::Message(format!(
                "matching.max_radius_miles must be positive, got {}",
                self.max_radius_miles
            )));
        }
        if !(self.default_radius_miles > 0.0 && self.default_radius_miles <= self.max_radius_miles) {
            return Err(ConfigError::Message(format!(
                "matching.default_radius_miles must be in (0, {}], got {}",
                self.max_radius_miles, self.default_radius_miles
            )));
        }
        if !(0..=MAX_RECENCY_WINDOW_DAYS).contains(&self.recency_window_days) {
            return Err(ConfigError::Message(format!(
                "matching.recency_window_days must be in [0, {}], got {}",
                MAX_RECENCY_WINDOW_DAYS, self.recency_window_days
            )));
        }
        let recency_window = chrono::Duration::try_days(self.recency_window_days).ok_or_else(|| {
            ConfigError::Message(format!(
                "matching.recency_window_days out of range: {}",
                self.recency_window_days
            ))
        })?;

        Ok(MatchPolicy {
            default_radius_miles: self.default_radius_miles,
            max_radius_miles: self.max_radius_miles,
            recency_window,
        })
    }
}

/// Upper bound for `matching.recency_window_days` (ten years)
const MAX_RECENCY_WINDOW_DAYS: i64 = 3650;

fn default_radius_miles() -> f64 { 25.0 }
fn default_max_radius_miles() -> f64 { 100.0 }
fn default_recency_window_days() -> i64 { 7 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with WINGMAN_)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., WINGMAN__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("WINGMAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WINGMAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }
}

/// Let the conventional DATABASE_URL variable override `database.url`
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.default_radius_miles, 25.0);
        assert_eq!(matching.max_radius_miles, 100.0);
        assert_eq!(matching.recency_window_days, 7);

        let policy = matching.policy().unwrap();
        assert_eq!(policy.recency_window, chrono::Duration::days(7));
    }

    #[test]
    fn test_policy_rejects_bad_radius() {
        let matching = MatchingSettings {
            default_radius_miles: 150.0,
            ..MatchingSettings::default()
        };
        assert!(matching.policy().is_err());

        let matching = MatchingSettings {
            max_radius_miles: 0.0,
            ..MatchingSettings::default()
        };
        assert!(matching.policy().is_err());
    }

    #[test]
    fn test_policy_rejects_negative_window() {
        let matching = MatchingSettings {
            recency_window_days: -1,
            ..MatchingSettings::default()
        };
        assert!(matching.policy().is_err());
    }

    #[test]
    fn test_policy_rejects_oversized_window() {
        let matching = MatchingSettings {
            recency_window_days: 1_000_000_000,
            ..MatchingSettings::default()
        };
        assert!(matching.policy().is_err());

        let matching = MatchingSettings {
            recency_window_days: MAX_RECENCY_WINDOW_DAYS,
            ..MatchingSettings::default()
        };
        assert!(matching.policy().is_ok());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
