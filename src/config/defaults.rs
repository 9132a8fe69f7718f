//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use std::path::PathBuf;

use crate::dashboard::{DEFAULT_LOG_LINES, FALLBACK_NAMESPACE};
use crate::trend::TrendCapacity;

/// Default time between polls
#[inline]
pub fn refresh_interval_ms() -> u64 {
    2000
}

/// Default bound on one provider call
#[inline]
pub fn poll_timeout_ms() -> u64 {
    10_000
}

/// Default samples kept per trend
#[inline]
pub fn trend_capacity() -> usize {
    TrendCapacity::DEFAULT.get()
}

#[inline]
pub fn log_buffer_lines() -> usize {
    DEFAULT_LOG_LINES
}

/// `esc` quits once no pane is open
#[inline]
pub fn esc_quits() -> bool {
    true
}

#[inline]
pub fn initial_namespace() -> String {
    FALLBACK_NAMESPACE.to_string()
}

/// Log file next to the working directory; stdout belongs to the terminal UI
#[inline]
pub fn log_file() -> PathBuf {
    PathBuf::from("kmet.log")
}

#[inline]
pub fn log_level() -> String {
    "info".to_string()
}
