//! Host runtime collaborators
//!
//! The session manager and poll publisher never talk to a browser directly.
//! They go through these traits:
//!
//! - [`IdentityHost`]: interactive authorization and the registered redirect URI
//! - [`TabHost`]: active tab lookup and one-shot script injection
//!
//! [`ConsoleIdentity`] and [`crate::browser::CdpTabHost`] are the implementations
//! used by the CLI.

pub mod console;

pub use console::ConsoleIdentity;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Host runtime errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Authorization flow cancelled")]
    Cancelled,

    #[error("Authorization flow requires user interaction")]
    InteractionRequired,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Script error: {0}")]
    Script(String),
}

/// Interactive authorization launcher
#[async_trait]
pub trait IdentityHost: Send + Sync {
    /// Redirect URI registered for the given provider key
    fn redirect_url(&self, provider: &str) -> String;

    /// Open `url` for the user and resolve with the final redirect URL
    async fn launch_web_auth_flow(&self, url: &str, interactive: bool)
        -> Result<String, HostError>;
}

/// Browser tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: String,
    pub url: String,
    pub title: String,
}

/// Return value of an injected script in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionResult {
    pub frame_id: String,
    pub result: Value,
}

/// Tab query and script injection
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The tab the user is looking at, if any
    async fn active_tab(&self) -> Result<Option<Tab>, HostError>;

    /// Run `function_source` (a JavaScript function expression) once in the
    /// page context of `tab` and collect its return value per frame.
    async fn execute_script(
        &self,
        tab: &Tab,
        function_source: &str,
    ) -> Result<Vec<InjectionResult>, HostError>;
}
