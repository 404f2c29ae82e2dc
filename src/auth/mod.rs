//! Twitch session management
//!
//! Implicit-grant OAuth against `id.twitch.tv`: builds the authorization
//! URL, runs the interactive flow through the [`IdentityHost`], checks the
//! echoed state, validates stored tokens and fetches the broadcaster
//! identity.
//!
//! The implicit grant has no refresh token. An expired token is reported
//! as [`TokenStatus::Invalid`] and the user has to log in again.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, FlowVariant, TwitchConfig};
use crate::host::{HostError, IdentityHost};
use crate::logging::redact;
use crate::session::{BroadcasterIdentity, Session, SessionState};
use crate::store::StoreError;
use crate::twitch::{HelixClient, HelixError};

/// Provider key used to derive the redirect URI
pub const PROVIDER_KEY: &str = "twitch";

const CLASSIC_STATE_PREFIX: &str = "'ducky-";

/// Session management errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),

    #[error("Twitch login failed: no access token in redirect")]
    MissingToken,

    #[error("Twitch login failed: state mismatch")]
    StateMismatch,

    #[error("Not logged in to Twitch")]
    NotAuthenticated,

    #[error("Twitch returned no user for this token")]
    NoUser,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Helix(#[from] HelixError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A prepared authorization attempt. State and nonce are single-use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub nonce: Option<String>,
}

/// Result of checking the stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Nothing stored
    NoSession,
    Valid,
    /// Rejected by the validation endpoint (usually expired)
    Invalid,
}

/// Values carried in the redirect fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub access_token: Option<String>,
    pub state: Option<String>,
}

/// Timing-safe string equality.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut out = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        out |= x ^ y;
    }
    out == 0
}

/// Percent-encode like JavaScript's `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    // urlencoding escapes everything outside ALPHA / DIGIT / "-_.~";
    // encodeURIComponent additionally keeps !'()* as-is
    urlencoding::encode(input)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Fresh anti-forgery state for one attempt
pub fn generate_state(flow: FlowVariant) -> String {
    match flow {
        FlowVariant::Classic => format!("{CLASSIC_STATE_PREFIX}{}", uuid::Uuid::new_v4()),
        FlowVariant::Strict => uuid::Uuid::new_v4().simple().to_string(),
    }
}

/// Fresh nonce for one attempt
pub fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Read `access_token` and `state` from the fragment of a redirect URL.
pub fn parse_redirect(redirect: &str) -> Result<RedirectParams, AuthError> {
    let url = url::Url::parse(redirect).map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;

    let mut params = RedirectParams::default();
    let Some(fragment) = url.fragment() else {
        return Ok(params);
    };

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" if params.access_token.is_none() => {
                params.access_token = Some(value.into_owned())
            }
            "state" if params.state.is_none() => params.state = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(params)
}

/// Owns the authenticated session with Twitch
pub struct SessionManager {
    twitch: TwitchConfig,
    flow: FlowVariant,
    helix: HelixClient,
    identity: Arc<dyn IdentityHost>,
    session: Session,
}

impl SessionManager {
    pub fn new(
        config: &Config,
        helix: HelixClient,
        identity: Arc<dyn IdentityHost>,
        session: Session,
    ) -> Self {
        Self {
            twitch: config.twitch.clone(),
            flow: config.flow,
            helix,
            identity,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Build the authorization URL with a freshly generated state (and
    /// nonce, for the strict flow).
    pub fn build_authorization_url(&self) -> AuthorizationRequest {
        let redirect_uri = self.identity.redirect_url(PROVIDER_KEY);
        let state = generate_state(self.flow);
        let nonce = self.flow.uses_nonce().then(generate_nonce);

        let mut url = format!(
            "{}/oauth2/authorize?client_id={}&redirect_uri={}&response_type=token&scope={}&state={}",
            self.helix.auth_base_url(),
            encode_uri_component(&self.twitch.client_id),
            encode_uri_component(&redirect_uri),
            encode_uri_component(&self.twitch.scopes.join(" ")),
            encode_uri_component(&state),
        );
        if let Some(nonce) = &nonce {
            url.push_str("&nonce=");
            url.push_str(&encode_uri_component(nonce));
        }

        AuthorizationRequest { url, state, nonce }
    }

    /// Check the stored token against the validation endpoint.
    ///
    /// Non-200 answers are `Invalid`, never errors; only transport failures
    /// are returned as `Err`.
    pub async fn check_stored_token_validity(&self) -> Result<TokenStatus, AuthError> {
        let Some(token) = self.session.access_token()? else {
            return Ok(TokenStatus::NoSession);
        };

        match self.helix.validate_token(&token).await {
            Ok(true) => Ok(TokenStatus::Valid),
            Ok(false) => Ok(TokenStatus::Invalid),
            Err(e) => {
                tracing::error!(error = %e, "error checking Twitch token validity");
                Err(e.into())
            }
        }
    }

    /// Run the interactive authorization flow.
    ///
    /// The token is stored only when it is present and the echoed state
    /// matches this attempt. A successful login goes on to fetch the
    /// identity; if that fetch fails the session stays `Authenticated`.
    pub async fn login(&self) -> Result<SessionState, AuthError> {
        let request = self.build_authorization_url();

        let redirect = match self.identity.launch_web_auth_flow(&request.url, true).await {
            Ok(redirect) => redirect,
            Err(e) => {
                tracing::error!(error = %e, "Twitch login failed");
                return Err(e.into());
            }
        };

        let params = parse_redirect(&redirect).inspect_err(|e| {
            tracing::error!(error = %e, redirect = %redact(&redirect), "Twitch login failed");
        })?;

        let state_matches = params
            .state
            .as_deref()
            .is_some_and(|echoed| timing_safe_eq(echoed, &request.state));
        if !state_matches {
            tracing::error!(redirect = %redact(&redirect), "Twitch login failed: invalid state");
            return Err(AuthError::StateMismatch);
        }

        let Some(token) = params.access_token.filter(|t| !t.is_empty()) else {
            tracing::error!("Twitch login failed: unable to extract access token");
            return Err(AuthError::MissingToken);
        };

        self.session.set_access_token(&token)?;
        tracing::info!("successfully logged in to Twitch");

        match self.fetch_identity().await {
            Ok(identity) => Ok(SessionState::Ready(identity)),
            Err(_) => Ok(SessionState::Authenticated),
        }
    }

    /// Fetch the current user and remember their broadcaster id.
    ///
    /// On failure the previously stored id is left untouched.
    pub async fn fetch_identity(&self) -> Result<BroadcasterIdentity, AuthError> {
        let Some(token) = self.session.access_token()? else {
            return Err(AuthError::NotAuthenticated);
        };

        let users = self.helix.get_users(&token).await.inspect_err(|e| {
            tracing::error!(error = %e, "error fetching Twitch user information");
        })?;

        let Some(user) = users.into_iter().next() else {
            tracing::error!("error fetching Twitch user information: empty user list");
            return Err(AuthError::NoUser);
        };

        let identity = BroadcasterIdentity::from(user);
        self.session.set_broadcaster_id(&identity.id)?;
        tracing::debug!(broadcaster_id = %identity.id, name = %identity.display_name, "fetched identity");
        Ok(identity)
    }

    /// Restore the session at startup.
    pub async fn resume(&self) -> Result<SessionState, AuthError> {
        match self.check_stored_token_validity().await? {
            TokenStatus::NoSession => Ok(SessionState::NoSession),
            TokenStatus::Invalid => {
                tracing::info!("Twitch access token is expired, log in again");
                Ok(SessionState::NoSession)
            }
            TokenStatus::Valid => {
                tracing::info!("user is already logged in to Twitch");
                match self.fetch_identity().await {
                    Ok(identity) => Ok(SessionState::Ready(identity)),
                    Err(_) => Ok(SessionState::Authenticated),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_safe_eq() {
        assert!(timing_safe_eq("'ducky-abc", "'ducky-abc"));
        assert!(!timing_safe_eq("'ducky-abc", "'ducky-abd"));
        assert!(!timing_safe_eq("short", "longer"));
        assert!(timing_safe_eq("", ""));
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(
            encode_uri_component("http://localhost:17563/twitch"),
            "http%3A%2F%2Flocalhost%3A17563%2Ftwitch"
        );
        assert_eq!(
            encode_uri_component("channel:manage:polls user:read:email"),
            "channel%3Amanage%3Apolls%20user%3Aread%3Aemail"
        );
        assert_eq!(encode_uri_component("'ducky-1(2)!*~"), "'ducky-1(2)!*~");
        assert_eq!(encode_uri_component("a+b&c=%"), "a%2Bb%26c%3D%25");
    }

    #[test]
    fn test_generate_state_formats() {
        let classic = generate_state(FlowVariant::Classic);
        assert!(classic.starts_with("'ducky-"));
        assert_eq!(classic.len(), "'ducky-".len() + 36);

        let strict = generate_state(FlowVariant::Strict);
        assert_eq!(strict.len(), 32);
        assert!(strict.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(generate_state(FlowVariant::Classic), classic);
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_parse_redirect_fragment() {
        let params = parse_redirect(
            "https://abc.chromiumapp.org/twitch#access_token=tok123&scope=channel%3Amanage%3Apolls&state=%27ducky-1&token_type=bearer",
        )
        .unwrap();
        assert_eq!(params.access_token.as_deref(), Some("tok123"));
        assert_eq!(params.state.as_deref(), Some("'ducky-1"));
    }

    #[test]
    fn test_parse_redirect_without_fragment() {
        let params =
            parse_redirect("http://localhost:17563/twitch?error=access_denied&state=x").unwrap();
        assert_eq!(params, RedirectParams::default());
    }

    #[test]
    fn test_parse_redirect_invalid_url() {
        assert!(matches!(
            parse_redirect("not a url"),
            Err(AuthError::InvalidRedirect(_))
        ));
    }
}
