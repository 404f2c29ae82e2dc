//! CDP (Chrome DevTools Protocol)
//!
//! Wire messages and response decoding for `Runtime.evaluate`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::host::HostError;

/// CDP command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpMessage {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl CdpMessage {
    /// `Runtime.evaluate` that calls `function_source` once and returns its
    /// value by value (awaiting it if it is a promise).
    pub fn call_function(id: u64, function_source: &str) -> Self {
        Self {
            id,
            method: "Runtime.evaluate".to_string(),
            params: Some(json!({
                "expression": format!("({})()", function_source.trim()),
                "returnByValue": true,
                "awaitPromise": true,
            })),
        }
    }
}

/// Debuggable target listed by `GET /json/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

/// Decode the reply to a `Runtime.evaluate` command into the returned value.
///
/// `undefined` and `null` both come back as `Value::Null`.
pub fn decode_evaluate_reply(reply: &Value) -> Result<Value, HostError> {
    if let Some(error) = reply.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown CDP error");
        return Err(HostError::Protocol(message.to_string()));
    }

    let result = reply
        .get("result")
        .ok_or_else(|| HostError::Protocol("reply has neither result nor error".to_string()))?;

    if let Some(details) = result.get("exceptionDetails") {
        let description = details
            .pointer("/exception/description")
            .and_then(Value::as_str)
            .or_else(|| details.get("text").and_then(Value::as_str))
            .unwrap_or("script threw");
        return Err(HostError::Script(description.to_string()));
    }

    Ok(result
        .pointer("/result/value")
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_function_message() {
        let msg = CdpMessage::call_function(7, "  function () { return 1; }\n");
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["id"], 7);
        assert_eq!(wire["method"], "Runtime.evaluate");
        assert_eq!(wire["params"]["expression"], "(function () { return 1; })()");
        assert_eq!(wire["params"]["returnByValue"], true);
    }

    #[test]
    fn test_decode_value() {
        let reply = json!({"id": 1, "result": {"result": {"type": "object", "value": ["Q?", "A"]}}});
        assert_eq!(decode_evaluate_reply(&reply).unwrap(), json!(["Q?", "A"]));
    }

    #[test]
    fn test_decode_null_and_undefined() {
        let null = json!({"id": 1, "result": {"result": {"type": "object", "subtype": "null", "value": null}}});
        let undefined = json!({"id": 1, "result": {"result": {"type": "undefined"}}});
        assert_eq!(decode_evaluate_reply(&null).unwrap(), Value::Null);
        assert_eq!(decode_evaluate_reply(&undefined).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_exception() {
        let reply = json!({"id": 1, "result": {
            "result": {"type": "object", "subtype": "error"},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "TypeError: x is null"}}
        }});
        let err = decode_evaluate_reply(&reply).unwrap_err();
        assert!(matches!(err, HostError::Script(ref m) if m == "TypeError: x is null"));
    }

    #[test]
    fn test_decode_protocol_error() {
        let reply = json!({"id": 1, "error": {"code": -32000, "message": "Cannot find context"}});
        assert!(matches!(
            decode_evaluate_reply(&reply),
            Err(HostError::Protocol(m)) if m == "Cannot find context"
        ));
    }

    #[test]
    fn test_target_list_parsing() {
        let targets: Vec<CdpTarget> = serde_json::from_str(
            r#"[{"id":"A1","type":"page","title":"TalesUp","url":"https://talesup.io/play","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/page/A1"},
                {"id":"W1","type":"service_worker","url":"chrome-extension://x/sw.js"}]"#,
        )
        .unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].kind, "page");
        assert_eq!(
            targets[0].web_socket_debugger_url.as_deref(),
            Some("ws://127.0.0.1:9222/devtools/page/A1")
        );
        assert_eq!(targets[1].title, "");
    }
}
