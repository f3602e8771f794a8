//! AppState construction and the startup probe, shared by `serve` and the
//! one-shot CLI commands.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use sr_domain::config::{Config, ConfigSeverity};
use sr_session::{Messenger, SessionClient, SessionState};

use crate::dispatch::EventDispatcher;
use crate::state::AppState;

/// Validate config, load the captured session and return a fully-wired
/// [`AppState`].
///
/// A missing or unreadable credential bundle does not fail startup: the
/// session degrades to empty and sends report the missing tokens.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Session client ───────────────────────────────────────────────
    let session = SessionState::load_or_empty(&config.session.account_file);
    tracing::info!(
        path = %config.session.account_file.display(),
        tokens = session.len(),
        identity_id = session.identity_id().unwrap_or("-"),
        "session state loaded"
    );

    let client = Arc::new(
        SessionClient::new(session, &config.session).context("creating session client")?,
    );

    // ── Inbound dispatcher ───────────────────────────────────────────
    let messenger: Arc<dyn Messenger> = client.clone();
    let dispatcher = Arc::new(EventDispatcher::new(messenger));

    Ok(AppState {
        config,
        client,
        dispatcher,
        started_at: Instant::now(),
    })
}

/// Best-effort connectivity check run once after the listener is up.
/// The outcome is only logged.
pub fn spawn_startup_probe(state: &AppState) {
    let client = state.client.clone();
    tokio::spawn(async move {
        let probe = client.verify_session().await;
        if probe.success {
            tracing::info!(status = ?probe.status, "platform connection test succeeded");
        } else {
            tracing::warn!(
                status = ?probe.status,
                error = probe.error.as_deref().unwrap_or("unknown"),
                "platform connection test failed"
            );
        }
    });
}
