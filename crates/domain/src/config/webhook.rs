use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verify token used when none is configured.  Anyone who knows it can
/// complete the webhook handshake, so [`super::Config::validate`] flags it.
pub const DEFAULT_VERIFY_TOKEN: &str = "test_token_123";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound webhook
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub mode: WebhookMode,

    /// Secret echoed back by the platform during the `hub.*` handshake.
    #[serde(default = "d_verify_token")]
    pub verify_token: String,

    /// App secret for `X-Hub-Signature-256` validation of POSTed events.
    /// Signature checks are skipped when unset.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Recipient used by `GET /send-message` when the query omits one.
    #[serde(default)]
    pub test_recipient: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            mode: WebhookMode::default(),
            verify_token: d_verify_token(),
            app_secret: None,
            test_recipient: None,
        }
    }
}

fn d_verify_token() -> String {
    DEFAULT_VERIFY_TOKEN.into()
}

/// Shape of `POST /webhook` payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
    /// Platform-standard `{object: "page", entry: [{messaging: [...]}]}`.
    #[default]
    Facebook,
    /// Direct control: `{recipient, message}` delivered synchronously.
    Custom,
}

impl fmt::Display for WebhookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookMode::Facebook => f.write_str("facebook"),
            WebhookMode::Custom => f.write_str("custom"),
        }
    }
}

impl FromStr for WebhookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(WebhookMode::Facebook),
            "custom" => Ok(WebhookMode::Custom),
            other => Err(format!(
                "unknown webhook mode '{other}' (expected 'facebook' or 'custom')"
            )),
        }
    }
}
