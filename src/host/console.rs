//! Console identity host
//!
//! Prints the authorization URL and reads back the URL the browser was
//! redirected to. The implicit grant puts the token in the URL fragment,
//! which never reaches a server, so the user pastes it from the address bar.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use super::{HostError, IdentityHost};
use crate::logging::redact;

type Input = Box<dyn AsyncBufRead + Unpin + Send>;

/// Identity host that talks to the user over stdin/stderr
pub struct ConsoleIdentity {
    redirect_base: String,
    input: Mutex<Input>,
}

impl ConsoleIdentity {
    /// Read redirects from stdin
    pub fn new(redirect_base: impl Into<String>) -> Self {
        Self::with_reader(redirect_base, BufReader::new(tokio::io::stdin()))
    }

    /// Read redirects from an arbitrary reader
    pub fn with_reader<R>(redirect_base: impl Into<String>, reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            redirect_base: redirect_base.into().trim_end_matches('/').to_string(),
            input: Mutex::new(Box::new(reader)),
        }
    }
}

#[async_trait]
impl IdentityHost for ConsoleIdentity {
    fn redirect_url(&self, provider: &str) -> String {
        format!("{}/{}", self.redirect_base, provider)
    }

    async fn launch_web_auth_flow(
        &self,
        url: &str,
        interactive: bool,
    ) -> Result<String, HostError> {
        if !interactive {
            return Err(HostError::InteractionRequired);
        }

        eprintln!("Open this URL in your browser and authorize the application:");
        eprintln!();
        eprintln!("  {}", url);
        eprintln!();
        eprintln!("Then paste the full URL you were redirected to:");

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| HostError::Unavailable(format!("failed to read redirect URL: {e}")))?;

        let redirect = line.trim();
        if read == 0 || redirect.is_empty() {
            return Err(HostError::Cancelled);
        }

        tracing::debug!(redirect = %redact(redirect), "received redirect");
        Ok(redirect.to_string())
    }
}
