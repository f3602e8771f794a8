//! Outbound send endpoints.
//!
//! `POST /send-message` takes `{recipient, message}` as JSON or as an
//! urlencoded form (the home page posts a form).  `GET /send-message`
//! reads the same fields from the query string and falls back to the
//! configured test recipient and a fixed greeting.

use axum::body::Bytes;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use serde::Deserialize;

use super::{api_error, ApiError};
use crate::state::AppState;

/// Message used by `GET /send-message` when none is given.
pub const DEFAULT_TEST_MESSAGE: &str = "Hello from the session relay!";

#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[axum::async_trait]
impl<S> FromRequest<S> for SendRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<SendRequest>::from_request(req, state)
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
            return Ok(body);
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")))
    }
}

impl SendRequest {
    /// Both fields, non-empty, or a message naming what is missing.
    pub(crate) fn require(self) -> Result<(String, String), String> {
        let recipient = self.recipient.filter(|r| !r.trim().is_empty());
        let message = self.message.filter(|m| !m.trim().is_empty());
        match (recipient, message) {
            (Some(r), Some(m)) => Ok((r, m)),
            (None, Some(_)) => Err("recipient is required".into()),
            (Some(_), None) => Err("message is required".into()),
            (None, None) => Err("recipient and message are required".into()),
        }
    }
}

/// `POST /send-message`
pub async fn send_post(State(state): State<AppState>, request: SendRequest) -> Response {
    let (recipient, message) = match request.require() {
        Ok(fields) => fields,
        Err(msg) => return api_error(StatusCode::BAD_REQUEST, msg),
    };
    deliver(&state, &recipient, &message, "Message sent successfully").await
}

/// `GET /send-message?recipient=...&message=...`
pub async fn send_get(
    State(state): State<AppState>,
    Query(query): Query<SendRequest>,
) -> Response {
    let request = SendRequest {
        recipient: query
            .recipient
            .filter(|r| !r.is_empty())
            .or_else(|| state.config.webhook.test_recipient.clone()),
        message: query
            .message
            .filter(|m| !m.is_empty())
            .or_else(|| Some(DEFAULT_TEST_MESSAGE.to_owned())),
    };
    let (recipient, message) = match request.require() {
        Ok(fields) => fields,
        Err(msg) => {
            return api_error(
                StatusCode::BAD_REQUEST,
                format!("{msg}; use ?recipient=USER_ID&message=TEXT"),
            )
        }
    };
    deliver(&state, &recipient, &message, "Test message sent").await
}

async fn deliver(state: &AppState, recipient: &str, message: &str, summary: &str) -> Response {
    match state.client.send(recipient, message).await {
        Ok(receipt) => Json(serde_json::json!({
            "success": true,
            "message": summary,
            "data": receipt,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(recipient = %recipient, error = %e, "send-message failed");
            ApiError(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(recipient: Option<&str>, message: Option<&str>) -> SendRequest {
        SendRequest {
            recipient: recipient.map(str::to_owned),
            message: message.map(str::to_owned),
        }
    }

    #[test]
    fn require_names_missing_field() {
        assert_eq!(req(Some("1"), None).require().unwrap_err(), "message is required");
        assert_eq!(req(None, Some("hi")).require().unwrap_err(), "recipient is required");
        assert_eq!(
            req(Some(" "), Some("")).require().unwrap_err(),
            "recipient and message are required"
        );
    }

    #[test]
    fn require_passes_both_fields() {
        assert_eq!(
            req(Some("1"), Some("hi")).require().unwrap(),
            ("1".to_string(), "hi".to_string())
        );
    }
}
