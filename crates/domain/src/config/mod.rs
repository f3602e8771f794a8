mod observability;
mod server;
mod session;
mod webhook;

pub use observability::*;
pub use server::*;
pub use session::*;
pub use webhook::*;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parse a TOML config file.  A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Overlay environment variables on top of the file/default values.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(token) = get("VERIFY_TOKEN") {
            self.webhook.verify_token = token;
        }
        if let Some(mode) = get("WEBHOOK_MODE") {
            self.webhook.mode = WebhookMode::from_str(&mode).map_err(Error::Config)?;
        }
        if let Some(secret) = get("APP_SECRET") {
            self.webhook.app_secret = Some(secret);
        }
        if let Some(recipient) = get("TEST_RECIPIENT") {
            self.webhook.test_recipient = Some(recipient);
        }
        if let Some(path) = get("ACCOUNT_FILE") {
            self.session.account_file = path.into();
        }
        if let Some(url) = get("PLATFORM_BASE_URL") {
            self.session.base_url = url;
        }
        if let Some(secs) = get("SEND_TIMEOUT_SECS") {
            self.session.send_timeout_secs = parse_env("SEND_TIMEOUT_SECS", &secs)?;
        }
        if let Some(strict) = get("STRICT_ACK") {
            self.session.strict_ack = parse_env("STRICT_ACK", &strict)?;
        }
        if let Some(endpoint) = get("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.observability.otlp_endpoint = Some(endpoint);
        }
        Ok(())
    }

    /// File (if present) + process environment.
    pub fn from_file_and_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.port == 0 {
            issues.push(ConfigIssue::error("server.port", "port must be greater than 0"));
        }
        if self.server.max_concurrent_requests == 0 {
            issues.push(ConfigIssue::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.server.host.is_empty() {
            issues.push(ConfigIssue::error("server.host", "host must not be empty"));
        }
        if self.session.base_url.is_empty() {
            issues.push(ConfigIssue::error(
                "session.base_url",
                "base_url must not be empty",
            ));
        }
        if self.session.send_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                "session.send_timeout_secs",
                "send timeout must be greater than 0",
            ));
        }
        if self.webhook.verify_token == DEFAULT_VERIFY_TOKEN {
            issues.push(ConfigIssue::warning(
                "webhook.verify_token",
                "using the built-in placeholder token; set VERIFY_TOKEN before exposing the webhook",
            ));
        }
        if self.webhook.app_secret.is_none() && self.webhook.mode == WebhookMode::Facebook {
            issues.push(ConfigIssue::warning(
                "webhook.app_secret",
                "no APP_SECRET configured; webhook event signatures are not verified",
            ));
        }

        issues
    }
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{name}={raw:?}: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation issues
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}
