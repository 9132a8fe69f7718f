//! Data-provider error types
//!
//! Failures while polling are transient and never stop the dashboard; they are
//! surfaced as a status marker while the previous snapshot stays on screen.
//! The end of a log stream is not an error: providers close the channel.

use std::fmt::Display;
use thiserror::Error;

use crate::domain::LogTarget;

/// Errors reported by metrics and log providers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProviderError {
    /// A poll or listing call failed
    #[error("failed to list {resource}: {message}")]
    Fetch {
        resource: &'static str,
        message: String,
    },

    /// A log subscription could not be opened
    #[error("failed to stream logs for {target}: {message}")]
    StreamStart { target: String, message: String },

    /// A provider call did not finish in time
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// The provider could not be constructed (fatal at startup)
    #[error("provider configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub fn fetch(resource: &'static str, error: impl Display) -> Self {
        Self::Fetch {
            resource,
            message: error.to_string(),
        }
    }

    pub fn stream_start(target: &LogTarget, error: impl Display) -> Self {
        Self::StreamStart {
            target: target.to_string(),
            message: error.to_string(),
        }
    }

    pub fn configuration(error: impl Display) -> Self {
        Self::Configuration(error.to_string())
    }

    /// Only configuration errors justify aborting startup
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
