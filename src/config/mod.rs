//! Configuration module
//!
//! Settings come from an optional TOML file, then command-line flags (and
//! their `KMET_*` environment variables) override individual fields.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{ConfigSource, load_config, load_config_with_fallback};
pub use types::{Config, DashboardConfig, LogConfig};
pub use validation::ConfigError;

// Re-export default functions for use in tests and other modules
pub use defaults::{
    esc_quits, initial_namespace, log_buffer_lines, log_file, log_level, poll_timeout_ms,
    refresh_interval_ms, trend_capacity,
};
