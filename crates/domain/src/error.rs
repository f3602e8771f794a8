use std::fmt;

/// Shared error type used across all SessionRelay crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    /// Credential bundle or configuration file missing / unparsable.
    #[error("config: {0}")]
    Config(String),

    /// Session tokens required for an operation are absent.
    #[error("auth: {0}")]
    Auth(String),

    #[error("HTTP: {0}")]
    Http(String),

    /// Both delivery tiers failed.  Only the fallback tier's failure is
    /// carried; the primary failure is logged where it happens.
    #[error("both methods failed: {0}")]
    Delivery(TransportFailure),
}

pub type Result<T> = std::result::Result<T, Error>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport failure
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A failed remote call: network error, timeout, or non-2xx status.
///
/// `status` and `body` are only present when the remote actually answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
    pub timed_out: bool,
}

impl TransportFailure {
    /// A failure where the remote answered with a non-success status.
    pub fn status(status: u16, body: String) -> Self {
        Self {
            message: format!("request failed with status code {status}"),
            status: Some(status),
            body: Some(body),
            timed_out: false,
        }
    }

    /// A failure that never produced a response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
            timed_out: false,
        }
    }

    /// A failure caused by the per-attempt deadline expiring.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
            timed_out: true,
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
