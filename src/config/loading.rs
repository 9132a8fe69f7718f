//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use super::types::Config;
use super::validation::ConfigError;

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl ConfigSource {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("config file '{}'", path.display()),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate()?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to the defaults
///
/// An explicitly named file that cannot be read is an error, not a fallback.
pub fn load_config_with_fallback(
    path: Option<&Path>,
) -> Result<(Config, ConfigSource), ConfigError> {
    match path {
        Some(path) => Ok((load_config(path)?, ConfigSource::File(path.to_path_buf()))),
        None => Ok((Config::default(), ConfigSource::Defaults)),
    }
}
