//! Platform webhook: the subscription handshake and inbound deliveries.
//!
//! `POST /webhook` accepts one of two shapes depending on
//! `webhook.mode`:
//!   - `facebook`: the page payload (`object == "page"`), every message
//!     event is answered in the background and the call returns
//!     `EVENT_RECEIVED` immediately.
//!   - `custom`: `{ "recipient": "...", "message": "..." }`, sent
//!     synchronously with the result returned as JSON.
//!
//! When `webhook.app_secret` is set, the body must carry a valid
//! `X-Hub-Signature-256: sha256=<hex>` HMAC.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use sr_domain::config::WebhookMode;

use super::send::SendRequest;
use super::{api_error, ApiError};
use crate::dispatch::PagePayload;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// ── Handshake ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// `GET /webhook`
///
/// Echoes `hub.challenge` when a mode is given and `hub.verify_token`
/// matches the configured token; `403` otherwise.
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let expected = state.config.webhook.verify_token.as_bytes();
    let token_ok = query
        .verify_token
        .as_deref()
        .is_some_and(|t| bool::from(t.as_bytes().ct_eq(expected)));

    if query.mode.is_some() && token_ok {
        tracing::info!(mode = query.mode.as_deref().unwrap_or(""), "webhook verified");
        (StatusCode::OK, query.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("webhook verification failed");
        StatusCode::FORBIDDEN.into_response()
    }
}

// ── Deliveries ─────────────────────────────────────────────────────

/// `POST /webhook`
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.config.webhook.app_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !signature_matches(secret, &body, header) {
            tracing::warn!("webhook signature rejected");
            return api_error(StatusCode::UNAUTHORIZED, "invalid webhook signature");
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")),
    };

    match state.config.webhook.mode {
        WebhookMode::Facebook => match serde_json::from_value::<PagePayload>(payload) {
            Ok(page) if page.is_page() => {
                let events = page.into_events();
                tracing::info!(events = events.len(), "page webhook received");
                for event in events {
                    state.dispatcher.spawn(event);
                }
                (StatusCode::OK, "EVENT_RECEIVED").into_response()
            }
            _ => api_error(StatusCode::BAD_REQUEST, "Invalid webhook mode or format"),
        },
        WebhookMode::Custom => {
            let request: SendRequest = serde_json::from_value(payload).unwrap_or_default();
            let (recipient, message) = match request.require() {
                Ok(fields) => fields,
                Err(msg) => return api_error(StatusCode::BAD_REQUEST, msg),
            };

            match state.client.send(&recipient, &message).await {
                Ok(receipt) => Json(serde_json::json!({
                    "success": true,
                    "message": "Message sent via session relay",
                    "data": receipt,
                }))
                .into_response(),
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "webhook send failed");
                    ApiError(e).into_response()
                }
            }
        }
    }
}

/// Check a `sha256=<hex>` signature header against the HMAC of `body`.
fn signature_matches(secret: &str, body: &[u8], header: &str) -> bool {
    let sig_hex = header.strip_prefix("sha256=").unwrap_or(header);
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());
    computed.as_bytes().ct_eq(sig_hex.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_accepted() {
        let header = sign("s3cret", b"{\"a\":1}");
        assert!(signature_matches("s3cret", b"{\"a\":1}", &header));
    }

    #[test]
    fn tampered_body_rejected() {
        let header = sign("s3cret", b"{\"a\":1}");
        assert!(!signature_matches("s3cret", b"{\"a\":2}", &header));
    }

    #[test]
    fn missing_header_rejected() {
        assert!(!signature_matches("s3cret", b"{}", ""));
    }
}
