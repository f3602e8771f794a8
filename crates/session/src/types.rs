use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sr_domain::error::TransportFailure;

/// A reply waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub recipient_id: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            text: text.into(),
        }
    }
}

/// Which tier delivered a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Structured mutation against the internal API.
    Primary,
    /// Multipart post to the user-facing send endpoint.
    Fallback,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMethod::Primary => f.write_str("primary"),
            DeliveryMethod::Fallback => f.write_str("fallback"),
        }
    }
}

/// Successful delivery.  `response` is the platform's body, passed through
/// without interpretation (JSON when it parses, a string otherwise).
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub success: bool,
    pub method: DeliveryMethod,
    pub recipient: String,
    pub message: String,
    pub response: Value,
}

/// Outcome of a read-only probe (`verify_session`, `profile`).
///
/// Probes never fail past their own boundary; a failure is a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn ok(status: u16, data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: Some(status),
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(failure: TransportFailure) -> Self {
        Self {
            success: false,
            status: failure.status,
            data: failure.body.as_deref().map(opaque_body),
            message: None,
            error: Some(failure.message),
        }
    }
}

/// Interpret a response body as JSON when possible, keeping it verbatim
/// otherwise.  The platform prefixes some JSON answers with `for (;;);`.
pub fn opaque_body(body: &str) -> Value {
    let candidate = body.strip_prefix("for (;;);").unwrap_or(body);
    serde_json::from_str(candidate).unwrap_or_else(|_| Value::String(body.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn opaque_body_parses_json_and_keeps_html() {
        assert_eq!(opaque_body(r#"{"ok":1}"#), json!({"ok": 1}));
        assert_eq!(opaque_body(r#"for (;;);{"payload":null}"#), json!({"payload": null}));
        assert_eq!(
            opaque_body("<html>login</html>"),
            Value::String("<html>login</html>".into())
        );
    }

    #[test]
    fn failed_probe_serializes_without_success_fields() {
        let probe = ProbeResult::failed(TransportFailure::status(401, "{\"error\":1}".into()));
        let value = serde_json::to_value(&probe).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["status"], 401);
        assert_eq!(value["data"], json!({"error": 1}));
        assert!(value.get("message").is_none());
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(serde_json::to_value(DeliveryMethod::Fallback).unwrap(), "fallback");
    }
}
