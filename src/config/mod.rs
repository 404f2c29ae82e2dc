//! Configuration loading
//!
//! Reads a JSON5 config file, falls back to defaults when it is absent and
//! applies `POLLBRIDGE_*` environment overrides on top.

pub mod types;

pub use types::{
    BrowserConfig, Config, FlowVariant, IdentityConfig, LogFormat, LoggingConfig, PageConfig,
    PollSettings, StorageConfig, TwitchConfig,
};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name used under the platform config dir.
pub const APP_DIR: &str = "pollbridge";

const CONFIG_PATH_ENV: &str = "POLLBRIDGE_CONFIG";
const CLIENT_ID_ENV: &str = "POLLBRIDGE_CLIENT_ID";
const LOG_LEVEL_ENV: &str = "POLLBRIDGE_LOG_LEVEL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Resolve the application directory under the platform config dir.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Resolve the configuration file path (`$POLLBRIDGE_CONFIG` wins).
pub fn get_config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => app_dir().join("config.json5"),
    }
}

/// Load configuration from the resolved path with environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_at(&get_config_path())
}

/// Load configuration from `path` with environment overrides.
pub fn load_config_at(path: &Path) -> Result<Config, ConfigError> {
    let mut config = load_config_from(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Load configuration from a specific file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse JSON5 configuration text.
pub fn parse_config(raw: &str) -> Result<Config, String> {
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    json5::from_str::<Config>(raw).map_err(|e| e.to_string())
}

/// Apply environment overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(client_id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
        config.twitch.client_id = client_id.trim().to_string();
    }
    if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
        config.logging.level = level.trim().to_string();
    }
}
