//! `sr-session` replays a captured browser session against the platform.
//!
//! [`SessionState`] is the parsed credential bundle (one entry per captured
//! cookie).  [`SessionClient`] wraps it, impersonates the logged-in browser
//! and delivers messages through two tiers: the internal mutation endpoint
//! first, the user-facing send form when that fails.
//!
//! ```rust,no_run
//! use sr_domain::config::SessionConfig;
//! use sr_session::{SessionClient, SessionState};
//!
//! # async fn example() -> sr_domain::error::Result<()> {
//! let cfg = SessionConfig::default();
//! let state = SessionState::load_or_empty(&cfg.account_file);
//! let client = SessionClient::new(state, &cfg)?;
//!
//! let receipt = client.send("100001234567890", "hello").await?;
//! println!("delivered via {}", receipt.method);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cookies;
pub mod messenger;
pub mod types;

pub use client::SessionClient;
pub use cookies::{RedactedToken, SessionState, SessionToken};
pub use messenger::Messenger;
pub use types::{DeliveryMethod, DeliveryReceipt, OutboundMessage, ProbeResult};
