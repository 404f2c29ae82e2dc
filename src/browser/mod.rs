//! Browser automation
//!
//! [`TabHost`] implementation backed by a Chrome instance started with
//! `--remote-debugging-port`. The active tab is the first `page` target in
//! `/json/list` (Chrome lists the most recently focused first); scripts are
//! run through `Runtime.evaluate` over the target's websocket.

pub mod cdp;

pub use cdp::{decode_evaluate_reply, CdpMessage, CdpTarget};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::config::BrowserConfig;
use crate::host::{HostError, InjectionResult, Tab, TabHost};

/// Tab host speaking CDP to a local Chrome
#[derive(Debug, Clone)]
pub struct CdpTabHost {
    http: reqwest::Client,
    devtools_url: url::Url,
}

impl CdpTabHost {
    pub fn new(config: &BrowserConfig) -> Result<Self, HostError> {
        let devtools_url = url::Url::parse(&config.devtools_url).map_err(|e| {
            HostError::Unavailable(format!("invalid devtools URL \"{}\": {e}", config.devtools_url))
        })?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| HostError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, devtools_url })
    }

    /// List debuggable targets
    pub async fn targets(&self) -> Result<Vec<CdpTarget>, HostError> {
        let list_url = self
            .devtools_url
            .join("/json/list")
            .map_err(|e| HostError::Unavailable(e.to_string()))?;

        let response = self.http.get(list_url).send().await.map_err(|e| {
            HostError::Unavailable(format!(
                "cannot reach Chrome at {} (is it running with --remote-debugging-port?): {e}",
                self.devtools_url
            ))
        })?;

        response
            .json::<Vec<CdpTarget>>()
            .await
            .map_err(|e| HostError::Protocol(format!("invalid /json/list response: {e}")))
    }

    /// Websocket URL of a page target
    pub fn websocket_url(&self, target_id: &str) -> Result<String, HostError> {
        let mut ws = self.devtools_url.clone();
        let scheme = if ws.scheme() == "https" { "wss" } else { "ws" };
        ws.set_scheme(scheme)
            .map_err(|_| HostError::Unavailable(format!("cannot derive websocket URL from {}", self.devtools_url)))?;
        ws.set_path(&format!("/devtools/page/{target_id}"));
        Ok(ws.to_string())
    }

    async fn evaluate(&self, ws_url: &str, message: &CdpMessage) -> Result<Value, HostError> {
        let (mut socket, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| HostError::Unavailable(format!("websocket connect failed: {e}")))?;

        let payload =
            serde_json::to_string(message).map_err(|e| HostError::Protocol(e.to_string()))?;
        socket
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| HostError::Protocol(e.to_string()))?;

        // Skip events until the reply with our id arrives
        let reply = loop {
            let frame = socket
                .next()
                .await
                .ok_or_else(|| HostError::Protocol("websocket closed before reply".to_string()))?
                .map_err(|e| HostError::Protocol(e.to_string()))?;

            match frame {
                Message::Text(text) => {
                    let value: Value = serde_json::from_str(text.as_str())
                        .map_err(|e| HostError::Protocol(format!("invalid CDP frame: {e}")))?;
                    if value.get("id").and_then(Value::as_u64) == Some(message.id) {
                        break value;
                    }
                }
                Message::Close(_) => {
                    return Err(HostError::Protocol("websocket closed before reply".to_string()))
                }
                _ => {}
            }
        };

        if let Err(e) = socket.close(None).await {
            tracing::debug!(error = %e, "websocket close failed");
        }
        decode_evaluate_reply(&reply)
    }
}

#[async_trait]
impl TabHost for CdpTabHost {
    async fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        let targets = self.targets().await?;
        Ok(targets
            .into_iter()
            .find(|t| t.kind == "page")
            .map(|t| Tab {
                id: t.id,
                url: t.url,
                title: t.title,
            }))
    }

    async fn execute_script(
        &self,
        tab: &Tab,
        function_source: &str,
    ) -> Result<Vec<InjectionResult>, HostError> {
        let ws_url = self.websocket_url(&tab.id)?;
        tracing::debug!(tab = %tab.id, "injecting script");

        let value = self
            .evaluate(&ws_url, &CdpMessage::call_function(1, function_source))
            .await?;

        // Runtime.evaluate only reaches the main frame
        Ok(vec![InjectionResult {
            frame_id: tab.id.clone(),
            result: value,
        }])
    }
}
