//! Typed configuration structures
//!
//! Provides strongly-typed access to configuration values with validation
//! and default values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Twitch application and endpoint settings
    pub twitch: TwitchConfig,
    /// Authorization/poll flow variant
    pub flow: FlowVariant,
    /// Page the prompt is scraped from
    pub page: PageConfig,
    /// Poll submission settings
    pub poll: PollSettings,
    /// Identity (interactive login) settings
    pub identity: IdentityConfig,
    /// Browser connection used for tab queries and script injection
    pub browser: BrowserConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Local key-value storage
    pub storage: StorageConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.twitch.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "twitch.clientId is required (or set POLLBRIDGE_CLIENT_ID)".to_string(),
            ));
        }
        if self.twitch.scopes.is_empty() {
            return Err(ConfigError::Invalid(
                "twitch.scopes must list at least one scope".to_string(),
            ));
        }
        for (field, value) in [
            ("twitch.authBaseUrl", &self.twitch.auth_base_url),
            ("twitch.apiBaseUrl", &self.twitch.api_base_url),
            ("identity.redirectBase", &self.identity.redirect_base),
            ("browser.devtoolsUrl", &self.browser.devtools_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{field} is not a valid URL: {e}")))?;
        }
        if self.page.host_match.trim().is_empty() {
            return Err(ConfigError::Invalid("page.hostMatch must not be empty".to_string()));
        }
        if self.poll.title.trim().is_empty() {
            return Err(ConfigError::Invalid("poll.title must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Twitch application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TwitchConfig {
    /// Registered application client id
    pub client_id: String,
    /// Requested OAuth scopes
    pub scopes: Vec<String>,
    /// Base URL of the identity service (authorize, validate)
    pub auth_base_url: String,
    /// Base URL of the Helix API
    pub api_base_url: String,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            scopes: vec!["channel:manage:polls".to_string()],
            auth_base_url: "https://id.twitch.tv".to_string(),
            api_base_url: "https://api.twitch.tv".to_string(),
        }
    }
}

/// The two flow variants that shipped side by side.
///
/// They differ in state format, nonce use, choice truncation budget and
/// poll duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    /// `'ducky-<uuid>` state, no nonce, 25 char choices, 45 s polls
    #[default]
    Classic,
    /// Hex state plus nonce, 22 char choices, 60 s polls
    Strict,
}

impl FlowVariant {
    /// Maximum characters per poll choice title.
    pub fn choice_budget(self) -> usize {
        match self {
            FlowVariant::Classic => 25,
            FlowVariant::Strict => 22,
        }
    }

    /// Poll duration in seconds.
    pub fn poll_duration_secs(self) -> u32 {
        match self {
            FlowVariant::Classic => 45,
            FlowVariant::Strict => 60,
        }
    }

    /// Whether authorization requests carry a nonce.
    pub fn uses_nonce(self) -> bool {
        matches!(self, FlowVariant::Strict)
    }
}

/// Page the prompt is scraped from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
    /// Substring the active tab URL must contain
    pub host_match: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            host_match: "talesup.io".to_string(),
        }
    }
}

/// Poll submission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    /// Title sent with every poll (the scraped question is not used)
    pub title: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            title: "Alors, que fait-on ?".to_string(),
        }
    }
}

/// Identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityConfig {
    /// Base of the registered redirect URI; the provider key is appended
    pub redirect_base: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            redirect_base: "http://localhost:17563".to_string(),
        }
    }
}

/// Browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    /// Chrome remote debugging endpoint (`--remote-debugging-port`)
    pub devtools_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            devtools_url: "http://127.0.0.1:9222".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Log level or filter directive (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, text)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Local key-value storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Storage file; defaults to `<config dir>/pollbridge/storage.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
