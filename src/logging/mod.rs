//! Logging setup and secret redaction
//!
//! Structured logging goes through `tracing`; this module installs the
//! subscriber and scrubs credentials out of strings before they are logged.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Logging error types
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Output goes to stderr so command output stays on stdout.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}

lazy_static! {
    static ref SECRET_PATTERNS: Vec<(Regex, &'static str)> = vec![
        // Authorization headers, both Bearer and the OAuth scheme used by /validate
        (
            Regex::new(r"(?i)(authorization:\s*(?:bearer|oauth)\s+)[a-zA-Z0-9_\-.]+").unwrap(),
            "${1}***REDACTED***"
        ),
        // Tokens in URL fragments and query strings
        (
            Regex::new(r"(?i)([#?&](?:access_token|id_token|token)=)[^&#\s]+").unwrap(),
            "${1}***REDACTED***"
        ),
        // JSON token fields
        (
            Regex::new(r##"(?i)("(?:access_token|accessToken|twitchAccessToken|token)"\s*:\s*")[^"]+"##).unwrap(),
            "${1}***REDACTED***"
        ),
    ];
}

/// Remove access tokens and authorization values from a string.
///
/// ```
/// use pollbridge::logging::redact;
///
/// let url = "https://localhost/twitch#access_token=abc123&state=x";
/// assert_eq!(redact(url), "https://localhost/twitch#access_token=***REDACTED***&state=x");
/// ```
pub fn redact(message: &str) -> String {
    let mut result = message.to_string();
    for (pattern, replacement) in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_fragment_token() {
        let redirect = "http://localhost:17563/twitch#access_token=0123abcd&scope=channel%3Amanage%3Apolls&state=%27ducky-1&token_type=bearer";
        let redacted = redact(redirect);
        assert!(!redacted.contains("0123abcd"));
        assert!(redacted.contains("state=%27ducky-1"));
        assert!(redacted.contains("token_type=bearer"));
    }

    #[test]
    fn test_redact_query_token() {
        let redacted = redact("https://example.com/cb?token=secret&x=1");
        assert_eq!(redacted, "https://example.com/cb?token=***REDACTED***&x=1");
    }

    #[test]
    fn test_redact_authorization_headers() {
        assert!(!redact("Authorization: Bearer abc.def-123").contains("abc.def-123"));
        assert!(!redact("authorization: OAuth zzz999").contains("zzz999"));
    }

    #[test]
    fn test_redact_json_fields() {
        let redacted = redact(r#"{"twitchAccessToken": "sekrit", "broadcasterId": "42"}"#);
        assert!(!redacted.contains("sekrit"));
        assert!(redacted.contains(r#""broadcasterId": "42""#));
    }

    #[test]
    fn test_redact_leaves_plain_text() {
        let text = "Twitch Poll Created";
        assert_eq!(redact(text), text);
    }
}
