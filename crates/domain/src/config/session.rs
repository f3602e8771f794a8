use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Captured session / platform client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON credential bundle: an array of `{key, value, domain?}` cookies.
    #[serde(default = "d_account_file")]
    pub account_file: PathBuf,

    /// Origin of the platform's web surface.  Every endpoint, `Origin` and
    /// `Referer` header is derived from it.
    #[serde(default = "d_base_url")]
    pub base_url: String,

    /// Browser identity presented on every request.
    #[serde(default = "d_user_agent")]
    pub user_agent: String,

    /// Deadline for each delivery attempt (primary and fallback tier
    /// separately) and for the profile fetch.
    #[serde(default = "d_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// When set, a primary-tier 2xx whose JSON body reports an error is
    /// treated as a failure and the fallback tier runs.
    #[serde(default)]
    pub strict_ack: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            account_file: d_account_file(),
            base_url: d_base_url(),
            user_agent: d_user_agent(),
            send_timeout_secs: d_send_timeout_secs(),
            strict_ack: false,
        }
    }
}

fn d_account_file() -> PathBuf {
    PathBuf::from("account.txt")
}
fn d_base_url() -> String {
    "https://www.facebook.com".into()
}
fn d_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into()
}
fn d_send_timeout_secs() -> u64 {
    15
}
