//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults;
use crate::args::Args;
use crate::dashboard::DashboardSettings;
use crate::domain::NamespaceScope;
use crate::trend::TrendCapacity;

/// Top-level configuration file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Polling and display behaviour
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Diagnostic log output
    #[serde(default)]
    pub log: LogConfig,
}

/// `[dashboard]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardConfig {
    #[serde(default = "defaults::refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "defaults::poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Samples kept per trend sparkline
    #[serde(default = "defaults::trend_capacity")]
    pub trend_capacity: usize,
    /// Most recent log lines kept by the logs pane
    #[serde(default = "defaults::log_buffer_lines")]
    pub log_buffer_lines: usize,
    #[serde(default = "defaults::esc_quits")]
    pub esc_quits: bool,
    /// Namespace shown at startup; `all` selects every namespace
    #[serde(default = "defaults::initial_namespace")]
    pub initial_namespace: String,
    /// Label selector applied to pod polls
    #[serde(default)]
    pub selector: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: defaults::refresh_interval_ms(),
            poll_timeout_ms: defaults::poll_timeout_ms(),
            trend_capacity: defaults::trend_capacity(),
            log_buffer_lines: defaults::log_buffer_lines(),
            esc_quits: defaults::esc_quits(),
            initial_namespace: defaults::initial_namespace(),
            selector: String::new(),
        }
    }
}

impl DashboardConfig {
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Trend capacity, falling back to the default for an unvalidated zero
    #[must_use]
    pub fn trend_capacity(&self) -> TrendCapacity {
        TrendCapacity::try_new(self.trend_capacity).unwrap_or_default()
    }

    /// Settings handed to the dashboard state machine
    #[must_use]
    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            refresh_interval: self.refresh_interval(),
            initial_namespace: NamespaceScope::parse(&self.initial_namespace),
            selector: self.selector.trim().to_string(),
            esc_quits: self.esc_quits,
            log_buffer_lines: self.log_buffer_lines,
        }
    }
}

/// `[log]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    #[serde(default = "defaults::log_file")]
    pub file: PathBuf,
    /// Used when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: defaults::log_file(),
            level: defaults::log_level(),
        }
    }
}

impl Config {
    /// Let command-line flags win over file values
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(namespace) = &args.namespace {
            self.dashboard.initial_namespace = namespace.clone();
        }
        if let Some(selector) = &args.selector {
            self.dashboard.selector = selector.clone();
        }
        if let Some(refresh_ms) = args.refresh_ms {
            self.dashboard.refresh_interval_ms = refresh_ms;
        }
        if args.no_esc_quit {
            self.dashboard.esc_quits = false;
        }
        if let Some(file) = &args.log_file {
            self.log.file = file.clone();
        }
        if let Some(level) = &args.log_level {
            self.log.level = level.clone();
        }
    }
}
