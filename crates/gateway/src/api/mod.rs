pub mod dashboard;
pub mod send;
pub mod status;
pub mod webhook;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use sr_domain::error::Error;

use crate::state::AppState;

/// Build the full route table.
pub fn router() -> Router<AppState> {
    Router::new()
        // ── Status page ────────────────────────────────────────────
        .route("/", get(dashboard::index))
        .route("/health", get(status::health))
        // ── Inbound webhook ────────────────────────────────────────
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        // ── Outbound send ──────────────────────────────────────────
        .route("/send-message", get(send::send_get).post(send::send_post))
        // ── Session diagnostics ────────────────────────────────────
        .route("/test-fb", get(status::test_connection))
        .route("/fb-state", get(status::session_state))
        .route("/profile", get(status::profile))
}

/// Router with middleware applied and state attached, ready to serve.
pub fn app(state: AppState) -> Router {
    let max_concurrent = state.config.server.max_concurrent_requests;
    router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error responses
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// A domain error leaving an HTTP handler.
///
/// Body: `{ "success": false, "error": "..." }`.  Delivery failures add
/// `timed_out`, plus the remote `status` and `response` when the platform
/// answered.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        });
        if let Error::Delivery(failure) = &self.0 {
            body["timed_out"] = failure.timed_out.into();
            if let Some(code) = failure.status {
                body["status"] = code.into();
            }
            if let Some(raw) = failure.body.as_deref() {
                body["response"] = sr_session::types::opaque_body(raw);
            }
        }

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_domain::error::TransportFailure;

    async fn body_of(err: Error) -> (StatusCode, serde_json::Value) {
        let resp = ApiError(err).into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn delivery_error_carries_remote_detail() {
        let (status, body) = body_of(Error::Delivery(TransportFailure::status(
            503,
            r#"{"error":"busy"}"#.into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 503);
        assert_eq!(body["response"]["error"], "busy");
        assert_eq!(body["timed_out"], false);
    }

    #[tokio::test]
    async fn delivery_timeout_is_flagged() {
        let (_, body) =
            body_of(Error::Delivery(TransportFailure::timeout("operation timed out"))).await;
        assert_eq!(body["timed_out"], true);
        assert!(body.get("status").is_none());
    }

    #[test]
    fn auth_error_is_internal() {
        let resp = ApiError(Error::Auth("missing".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
