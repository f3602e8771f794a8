use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "sessionrelay";

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs_f64(),
        "session_loaded": !state.client.state().is_empty(),
    }))
}

/// `GET /test-fb`: the session verification probe, as-is.
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.client.verify_session().await)
}

/// `GET /profile`
pub async fn profile(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.client.profile().await)
}

/// `GET /fb-state`: loaded tokens with values truncated.  A degraded
/// (empty) session still answers, with a zero count.
pub async fn session_state(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.client.state();
    Json(serde_json::json!({
        "cookies_count": session.len(),
        "user_id": session.identity_id(),
        "cookies": session.redacted(),
        "loaded_from": session.source().map(|p| p.display().to_string()),
    }))
}
