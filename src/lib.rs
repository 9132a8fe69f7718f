//! Live terminal dashboard for Kubernetes pod and node resource usage
//!
//! The [`dashboard`] state machine is pure: it consumes [`dashboard::Event`]s and
//! returns [`dashboard::Command`]s. The [`tui`] module runs those commands
//! against a [`domain::MetricsSource`] and [`domain::LogSource`] and draws each
//! resulting state with ratatui.

pub mod args;
pub mod cancel;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod formatting;
pub mod layout;
pub mod logging;
pub mod provider;
pub mod render;
pub mod runtime;
pub mod trend;
pub mod tui;

pub use args::Args;
pub use config::{Config, ConfigError, ConfigSource, load_config, load_config_with_fallback};
pub use dashboard::{Command, Dashboard, DashboardSettings, Event};
pub use error::ProviderError;
pub use runtime::RuntimeConfig;
pub use trend::TrendCapacity;
