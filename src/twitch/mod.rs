//! Twitch REST client
//!
//! Thin wrapper over the three endpoints this tool needs:
//!
//! - `GET  {id}/oauth2/validate` (token introspection)
//! - `GET  {api}/helix/users`    (current user)
//! - `POST {api}/helix/polls`    (poll creation)
//!
//! Base URLs are configurable so tests can point the client at a local server.

pub mod types;

pub use types::{HelixData, HelixUser};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;

use crate::config::TwitchConfig;
use crate::polls::PollDraft;

const CLIENT_ID_HEADER: &str = "Client-ID";

/// Twitch API errors
#[derive(Debug, Error)]
pub enum HelixError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

/// Client for the Twitch identity and Helix APIs
#[derive(Debug, Clone)]
pub struct HelixClient {
    http: reqwest::Client,
    client_id: String,
    auth_base_url: String,
    api_base_url: String,
}

impl HelixClient {
    /// Build a client from configuration. No request timeouts are set.
    pub fn new(config: &TwitchConfig) -> Result<Self, HelixError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pollbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HelixError::Client(e.to_string()))?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Base URL of the identity service
    pub fn auth_base_url(&self) -> &str {
        &self.auth_base_url
    }

    /// Ask the identity service whether `token` is still valid.
    ///
    /// Returns `Ok(true)` only for HTTP 200; any other status is `Ok(false)`.
    /// Only transport failures are errors.
    pub async fn validate_token(&self, token: &str) -> Result<bool, HelixError> {
        const ENDPOINT: &str = "oauth2/validate";
        let url = format!("{}/oauth2/validate", self.auth_base_url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("OAuth {token}"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|source| HelixError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "token validation response");
        Ok(status == reqwest::StatusCode::OK)
    }

    /// Fetch the users the token belongs to (`data` array of `/helix/users`).
    pub async fn get_users(&self, token: &str) -> Result<Vec<HelixUser>, HelixError> {
        const ENDPOINT: &str = "helix/users";
        let url = format!("{}/helix/users", self.api_base_url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|source| HelixError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| HelixError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;

        if !status.is_success() {
            return Err(HelixError::Status {
                endpoint: ENDPOINT,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: HelixData<HelixUser> =
            serde_json::from_str(&body).map_err(|e| HelixError::Decode {
                endpoint: ENDPOINT,
                message: e.to_string(),
            })?;
        Ok(parsed.data)
    }

    /// Submit a poll and return the parsed response body.
    ///
    /// The HTTP status is not inspected; callers judge the
    /// outcome from the body shape. An empty body or a JSON `null` yields
    /// `Ok(None)`.
    pub async fn create_poll(
        &self,
        token: &str,
        draft: &PollDraft,
    ) -> Result<Option<Value>, HelixError> {
        const ENDPOINT: &str = "helix/polls";
        let url = format!("{}/helix/polls", self.api_base_url);

        let body = serde_json::to_string(draft).map_err(|e| HelixError::Decode {
            endpoint: ENDPOINT,
            message: e.to_string(),
        })?;

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| HelixError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| HelixError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        tracing::debug!(status = status.as_u16(), bytes = text.len(), "poll creation response");

        if text.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| HelixError::Decode {
            endpoint: ENDPOINT,
            message: e.to_string(),
        })?;

        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }
}
