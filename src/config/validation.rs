//! Configuration validation

use std::path::PathBuf;
use thiserror::Error;

use super::types::Config;

/// Polling faster than this only burns API quota
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

/// Problems loading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl Config {
    /// Reject values the dashboard cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dashboard = &self.dashboard;
        if dashboard.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be non-zero"));
        }
        if dashboard.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(invalid(
                "refresh_interval_ms",
                format!(
                    "{}ms is below the {}ms minimum",
                    dashboard.refresh_interval_ms, MIN_REFRESH_INTERVAL_MS
                ),
            ));
        }
        if dashboard.poll_timeout_ms == 0 {
            return Err(invalid("poll_timeout_ms", "must be non-zero"));
        }
        if dashboard.trend_capacity == 0 {
            return Err(invalid("trend_capacity", "must be non-zero"));
        }
        if dashboard.log_buffer_lines == 0 {
            return Err(invalid("log_buffer_lines", "must be non-zero"));
        }
        if self.log.level.trim().is_empty() {
            return Err(invalid("log.level", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = Config::default();
        config.dashboard.trend_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "trend_capacity",
                ..
            })
        ));

        let mut config = Config::default();
        config.dashboard.poll_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dashboard.log_buffer_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_fast_refresh() {
        let mut config = Config::default();
        config.dashboard.refresh_interval_ms = 50;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid refresh_interval_ms: 50ms is below the 100ms minimum"
        );

        config.dashboard.refresh_interval_ms = MIN_REFRESH_INTERVAL_MS;
        assert!(config.validate().is_ok());
    }
}
