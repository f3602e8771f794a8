//! Captured-session credential bundle.
//!
//! The bundle is a JSON array of cookies as exported from a logged-in
//! browser:
//!
//! ```json
//! [
//!   { "key": "c_user", "value": "100001234567890", "domain": "facebook.com" },
//!   { "key": "xs", "value": "12%3Aabc...", "domain": "facebook.com" }
//! ]
//! ```
//!
//! Extra fields (`path`, `hostOnly`, `creation`, ...) are ignored.  The
//! state is built once at startup and never refreshed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sr_domain::error::{Error, Result};
use sr_domain::trace::TraceEvent;

/// Cookie naming the logged-in account.
pub const IDENTITY_KEY: &str = "c_user";
/// Cookie required to authorize state-changing requests.
pub const SECURITY_KEY: &str = "xs";
/// Optional anti-CSRF token sent as `X-FB-LSD` when captured.
pub const LSD_KEY: &str = "lsd";

/// Most characters of a cookie value shown by [`SessionState::redacted`].
/// Never more than half of the value is shown.
const REDACTED_PREFIX_CHARS: usize = 20;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tokens
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One captured cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(alias = "name")]
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl SessionToken {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            domain: None,
        }
    }
}

/// A token as shown on status pages: value cut to a short prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedToken {
    pub key: String,
    pub value: String,
    pub domain: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ordered captured cookies plus the two tokens delivery depends on.
///
/// Keys are not required to be unique.  Lookups return the **first**
/// token with a matching key, while [`cookie_header`](Self::cookie_header)
/// serializes every token in stored order.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    tokens: Vec<SessionToken>,
    source: Option<PathBuf>,
    identity_id: Option<String>,
    security_token: Option<String>,
}

impl SessionState {
    /// A state with no tokens.  Every send against it fails with
    /// [`Error::Auth`].
    pub fn empty(source: Option<PathBuf>) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    pub fn from_tokens(tokens: Vec<SessionToken>, source: Option<PathBuf>) -> Self {
        let identity_id = first_value(&tokens, IDENTITY_KEY);
        let security_token = first_value(&tokens, SECURITY_KEY);
        Self {
            tokens,
            source,
            identity_id,
            security_token,
        }
    }

    /// Parse a credential bundle from its JSON text.
    pub fn parse(raw: &str) -> Result<Vec<SessionToken>> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("credential bundle is not a cookie array: {e}")))
    }

    /// Read and parse the bundle at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "credential bundle {} not found",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path)?;
        let tokens = Self::parse(&raw)?;
        let state = Self::from_tokens(tokens, Some(path.to_path_buf()));

        let duplicates = state.duplicate_keys();
        if !duplicates.is_empty() {
            tracing::warn!(
                keys = ?duplicates,
                "credential bundle contains duplicate keys; the first occurrence is used for lookups"
            );
        }
        if state.identity_id.is_none() {
            tracing::warn!(path = %path.display(), "{IDENTITY_KEY} cookie not found");
        }

        Ok(state)
    }

    /// Load the bundle, degrading to an empty state on any failure.
    ///
    /// The failure is logged here; the process keeps running and later
    /// deliveries report the missing tokens.
    pub fn load_or_empty(path: &Path) -> Self {
        let state = Self::load(path).unwrap_or_else(|e| {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to load session state, starting with an empty session"
            );
            Self::empty(Some(path.to_path_buf()))
        });

        TraceEvent::SessionLoaded {
            source: path.display().to_string(),
            token_count: state.len(),
            identity_id: state.identity_id.clone(),
            has_security_token: state.security_token.is_some(),
        }
        .emit();

        state
    }

    // ── accessors ────────────────────────────────────────────────────

    /// `key=value` pairs joined by `"; "` in stored order.
    ///
    /// Values are not escaped: a value containing `;` splits into two
    /// cookies on the wire.
    pub fn cookie_header(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    pub fn security_token(&self) -> Option<&str> {
        self.security_token.as_deref()
    }

    pub fn lsd_token(&self) -> Option<&str> {
        self.find(LSD_KEY)
    }

    /// Value of the first token named `key`.
    pub fn find(&self, key: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn tokens(&self) -> &[SessionToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Keys that appear more than once, in order of their second occurrence.
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for token in &self.tokens {
            if !seen.insert(token.key.as_str()) && !duplicates.contains(&token.key.as_str()) {
                duplicates.push(token.key.as_str());
            }
        }
        duplicates
    }

    /// Tokens with their values cut to a short prefix, safe to display.
    pub fn redacted(&self) -> Vec<RedactedToken> {
        self.tokens
            .iter()
            .map(|t| RedactedToken {
                key: t.key.clone(),
                value: redact(&t.value),
                domain: t.domain.clone(),
            })
            .collect()
    }
}

/// Short prefix of `value`, at most half of it, followed by `...`.
fn redact(value: &str) -> String {
    let shown = REDACTED_PREFIX_CHARS.min(value.chars().count() / 2);
    format!("{}...", value.chars().take(shown).collect::<String>())
}

fn first_value(tokens: &[SessionToken], key: &str) -> Option<String> {
    tokens.iter().find(|t| t.key == key).map(|t| t.value.clone())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bundle(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cookie_header_joins_in_order() {
        let state = SessionState::from_tokens(
            vec![SessionToken::new("a", "1"), SessionToken::new("b", "2")],
            None,
        );
        assert_eq!(state.cookie_header(), "a=1; b=2");
    }

    #[test]
    fn empty_state_has_empty_header() {
        let state = SessionState::empty(None);
        assert_eq!(state.cookie_header(), "");
        assert!(state.identity_id().is_none());
        assert!(state.security_token().is_none());
    }

    #[test]
    fn duplicate_keys_resolve_to_first_occurrence() {
        let state = SessionState::from_tokens(
            vec![
                SessionToken::new("c_user", "first"),
                SessionToken::new("xs", "x1"),
                SessionToken::new("c_user", "second"),
            ],
            None,
        );
        assert_eq!(state.identity_id(), Some("first"));
        assert_eq!(state.security_token(), Some("x1"));
        assert_eq!(state.duplicate_keys(), vec!["c_user"]);
        // The header keeps both.
        assert_eq!(state.cookie_header(), "c_user=first; xs=x1; c_user=second");
    }

    #[test]
    fn load_reads_bundle_and_ignores_extra_fields() {
        let file = bundle(
            r#"[
                {"key": "datr", "value": "d4tr", "domain": "facebook.com", "path": "/", "hostOnly": false},
                {"key": "c_user", "value": "100001234567890", "domain": "facebook.com"},
                {"key": "xs", "value": "12%3Aabc"}
            ]"#,
        );
        let state = SessionState::load(file.path()).unwrap();
        assert_eq!(state.len(), 3);
        assert_eq!(state.identity_id(), Some("100001234567890"));
        assert_eq!(state.security_token(), Some("12%3Aabc"));
        assert_eq!(state.tokens()[0].domain.as_deref(), Some("facebook.com"));
        assert!(state.tokens()[2].domain.is_none());
        assert_eq!(state.source(), Some(file.path()));
    }

    #[test]
    fn name_is_accepted_as_key_alias() {
        let tokens = SessionState::parse(r#"[{"name": "c_user", "value": "42"}]"#).unwrap();
        assert_eq!(tokens[0].key, "c_user");
    }

    #[test]
    fn missing_bundle_is_config_error() {
        let err = SessionState::load(Path::new("/no/such/account.txt")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_bundle_is_config_error() {
        for raw in ["not json", "{\"key\": \"c_user\"}", "[{\"key\": 1}]", ""] {
            let file = bundle(raw);
            let err = SessionState::load(file.path()).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "input {raw:?} gave {err}");
        }
    }

    #[test]
    fn load_or_empty_degrades_without_panicking() {
        let missing = SessionState::load_or_empty(Path::new("/no/such/account.txt"));
        assert!(missing.is_empty());
        assert!(missing.identity_id().is_none());

        let file = bundle("[{");
        let malformed = SessionState::load_or_empty(file.path());
        assert!(malformed.is_empty());
        assert_eq!(malformed.source(), Some(file.path()));
    }

    #[test]
    fn redacted_values_are_truncated() {
        let state = SessionState::from_tokens(
            vec![
                SessionToken::new("xs", "0123456789abcdefghijKLMNOP"),
                SessionToken::new("c_user", "42"),
            ],
            None,
        );
        let redacted = state.redacted();
        assert_eq!(redacted[0].value, "0123456789abc...");
        assert_eq!(redacted[1].value, "4...");
        assert!(!redacted[0].value.contains("KLMNOP"));
    }

    #[test]
    fn redacted_never_reveals_a_whole_value() {
        let state = SessionState::from_tokens(
            vec![
                SessionToken::new("xs", "shortsecretxs"),
                SessionToken::new("lsd", "x"),
                SessionToken::new("datr", &"v".repeat(60)),
            ],
            None,
        );
        let redacted = state.redacted();
        assert_eq!(redacted[0].value, "shorts...");
        assert!(!redacted[0].value.contains("shortsecretxs"));
        assert_eq!(redacted[1].value, "...");
        assert_eq!(redacted[2].value, format!("{}...", "v".repeat(20)));
    }

    #[test]
    fn lsd_token_is_optional() {
        let state = SessionState::from_tokens(vec![SessionToken::new("lsd", "AVq")], None);
        assert_eq!(state.lsd_token(), Some("AVq"));
        assert!(SessionState::empty(None).lsd_token().is_none());
    }
}
