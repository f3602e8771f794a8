//! Session-replay messaging client.
//!
//! `SessionClient` presents the captured cookies with a fixed browser
//! identity and talks to three platform surfaces:
//!
//! | Operation          | Request                                   |
//! |--------------------|-------------------------------------------|
//! | `verify_session`   | `GET  /api/graphql/?av&__user&__a=1`      |
//! | `send` (primary)   | `POST /api/graphql/` send-message mutation|
//! | `send` (fallback)  | `POST /messaging/send/` multipart form    |
//! | `profile`          | `GET  /me`                                |
//!
//! Delivery never retries: each tier runs at most once per call and each
//! attempt is cut off by the configured per-attempt timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use sr_domain::config::SessionConfig;
use sr_domain::error::{Error, Result, TransportFailure};
use sr_domain::trace::TraceEvent;

use crate::cookies::SessionState;
use crate::types::{opaque_body, DeliveryMethod, DeliveryReceipt, ProbeResult};

const GRAPHQL_PATH: &str = "/api/graphql/";
const FALLBACK_SEND_PATH: &str = "/messaging/send/";
const PROFILE_PATH: &str = "/me";

const SEND_MUTATION_NAME: &str = "MessengerSendMessageMutation";
const SEND_MUTATION_DOC_ID: &str = "6663272400232946";
/// Sent as `X-FB-LSD` when the bundle carries no `lsd` cookie.
const LSD_PLACEHOLDER: &str = "AVpVf4g5";

const BROWSER_LANGUAGE: &str = "en-US,en;q=0.9";
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Authenticated platform client built from a [`SessionState`].
///
/// Created once at startup and shared for the lifetime of the process.
/// The session state is immutable; the only interior state is the nonce
/// counter, which is lock-free.
#[derive(Debug)]
pub struct SessionClient {
    http: Client,
    state: SessionState,
    base_url: String,
    user_agent: String,
    send_timeout: Duration,
    strict_ack: bool,
    last_nonce: AtomicU64,
}

impl SessionClient {
    pub fn new(state: SessionState, cfg: &SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            state,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            user_agent: cfg.user_agent.clone(),
            send_timeout: Duration::from_secs(cfg.send_timeout_secs),
            strict_ack: cfg.strict_ack,
            last_nonce: AtomicU64::new(0),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    // ── Probes ───────────────────────────────────────────────────────

    /// Authenticated read against the status endpoint.  Any 2xx counts as a
    /// live session; the body is not interpreted.
    pub async fn verify_session(&self) -> ProbeResult {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(3);
        if let Some(id) = self.state.identity_id() {
            query.push(("av", id));
            query.push(("__user", id));
        }
        query.push(("__a", "1"));

        let rb = self
            .decorate(self.http.get(self.url(GRAPHQL_PATH)))
            .query(&query)
            .header(ACCEPT, "application/json")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Dest", "empty")
            .header(REFERER, format!("{}/", self.base_url))
            .timeout(VERIFY_TIMEOUT);

        match self.execute("verify", GRAPHQL_PATH, rb).await {
            Ok((status, data)) => ProbeResult::ok(status, data, "platform connection successful"),
            Err(failure) => ProbeResult::failed(failure),
        }
    }

    /// Fetch the logged-in account's identity page.
    pub async fn profile(&self) -> ProbeResult {
        let rb = self
            .decorate(self.http.get(self.url(PROFILE_PATH)))
            .timeout(self.send_timeout);

        match self.execute("profile", PROFILE_PATH, rb).await {
            Ok((status, data)) => ProbeResult::ok(status, data, "profile fetched"),
            Err(failure) => ProbeResult::failed(failure),
        }
    }

    // ── Delivery ─────────────────────────────────────────────────────

    /// Deliver `text` to `recipient_id`.
    ///
    /// 1. Both the identity and security tokens must be present, otherwise
    ///    [`Error::Auth`] is returned before any request is made.
    /// 2. The primary tier runs; success is returned immediately.
    /// 3. On any primary failure the fallback tier runs once.  If it fails
    ///    too, [`Error::Delivery`] carries the fallback failure.
    pub async fn send(&self, recipient_id: &str, text: &str) -> Result<DeliveryReceipt> {
        let started = Instant::now();

        let (Some(identity), Some(_)) = (self.state.identity_id(), self.state.security_token())
        else {
            TraceEvent::DeliveryFailed {
                recipient: recipient_id.to_owned(),
                reason: "missing session tokens".into(),
            }
            .emit();
            return Err(Error::Auth(
                "missing required session tokens (c_user or xs)".into(),
            ));
        };

        let (method, response) = match self.send_primary(identity, recipient_id, text).await {
            Ok(response) => (DeliveryMethod::Primary, response),
            Err(primary) => {
                tracing::warn!(
                    recipient = %recipient_id,
                    status = ?primary.status,
                    timed_out = primary.timed_out,
                    error = %primary,
                    "primary delivery failed, trying fallback"
                );
                match self.send_fallback(recipient_id, text).await {
                    Ok(response) => (DeliveryMethod::Fallback, response),
                    Err(fallback) => {
                        TraceEvent::DeliveryFailed {
                            recipient: recipient_id.to_owned(),
                            reason: fallback.message.clone(),
                        }
                        .emit();
                        return Err(Error::Delivery(fallback));
                    }
                }
            }
        };

        TraceEvent::DeliveryCompleted {
            recipient: recipient_id.to_owned(),
            method: method.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(DeliveryReceipt {
            success: true,
            method,
            recipient: recipient_id.to_owned(),
            message: text.to_owned(),
            response,
        })
    }

    async fn send_primary(
        &self,
        identity: &str,
        recipient_id: &str,
        text: &str,
    ) -> std::result::Result<Value, TransportFailure> {
        let variables = json!({
            "input": {
                "client_mutation_id": "1",
                "actor_id": identity,
                "offline_threading_id": self.next_nonce().to_string(),
                "message": { "text": text },
                "thread_id": recipient_id,
                "sync_group": 1,
            }
        })
        .to_string();

        let form = [
            ("av", identity),
            ("__user", identity),
            ("__a", "1"),
            ("__req", "1"),
            ("fb_api_caller_class", "RelayModern"),
            ("fb_api_req_friendly_name", SEND_MUTATION_NAME),
            ("variables", variables.as_str()),
            ("server_timestamps", "true"),
            ("doc_id", SEND_MUTATION_DOC_ID),
        ];

        let rb = self
            .decorate(self.http.post(self.url(GRAPHQL_PATH)))
            .form(&form[..])
            .header(ACCEPT, "*/*")
            .header(ORIGIN, &self.base_url)
            .header(REFERER, self.thread_url(recipient_id))
            .header("X-FB-Friendly-Name", SEND_MUTATION_NAME)
            .header("X-FB-LSD", self.state.lsd_token().unwrap_or(LSD_PLACEHOLDER))
            .timeout(self.send_timeout);

        let (_, body) = self.execute("primary", GRAPHQL_PATH, rb).await?;

        if self.strict_ack {
            if let Some(reason) = rejection_reason(&body) {
                return Err(TransportFailure {
                    message: format!("platform rejected message: {reason}"),
                    status: None,
                    body: Some(body.to_string()),
                    timed_out: false,
                });
            }
        }
        Ok(body)
    }

    async fn send_fallback(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> std::result::Result<Value, TransportFailure> {
        let form = reqwest::multipart::Form::new()
            .text("ids[0]", recipient_id.to_owned())
            .text("body", text.to_owned())
            .text("waterfall_source", "message");

        let rb = self
            .decorate(self.http.post(self.url(FALLBACK_SEND_PATH)))
            .multipart(form)
            .header(ORIGIN, &self.base_url)
            .header(REFERER, self.thread_url(recipient_id))
            .timeout(self.send_timeout);

        let (_, body) = self.execute("fallback", FALLBACK_SEND_PATH, rb).await?;
        Ok(body)
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Attach the captured session and browser identity.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header(COOKIE, self.state.cookie_header())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT_LANGUAGE, BROWSER_LANGUAGE)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn thread_url(&self, recipient_id: &str) -> String {
        format!("{}/messages/t/{}", self.base_url, recipient_id)
    }

    /// Send one request and classify the answer.  Non-2xx statuses become
    /// failures carrying the status and body.
    async fn execute(
        &self,
        tier: &str,
        endpoint: &str,
        rb: RequestBuilder,
    ) -> std::result::Result<(u16, Value), TransportFailure> {
        let start = Instant::now();
        let result = rb.send().await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::PlatformCall {
                    endpoint: endpoint.to_owned(),
                    tier: tier.to_owned(),
                    status: 0,
                    duration_ms: start.elapsed().as_millis() as u64,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        let body = resp.text().await.map_err(from_reqwest)?;

        TraceEvent::PlatformCall {
            endpoint: endpoint.to_owned(),
            tier: tier.to_owned(),
            status: status.as_u16(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        if !status.is_success() {
            return Err(TransportFailure::status(status.as_u16(), body));
        }
        Ok((status.as_u16(), opaque_body(&body)))
    }

    /// Millisecond timestamp, bumped so that concurrent calls never share
    /// a value and later calls never go backwards.
    fn next_nonce(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut prev = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_nonce.compare_exchange_weak(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Convert a [`reqwest::Error`] into a tier failure, flagging timeouts.
fn from_reqwest(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::timeout(e.to_string())
    } else {
        TransportFailure::network(e.to_string())
    }
}

/// An application-level error reported inside a 2xx body, if any.
fn rejection_reason(body: &Value) -> Option<String> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        let first = errors.first()?;
        return Some(
            first
                .get("message")
                .or_else(|| first.get("summary"))
                .and_then(Value::as_str)
                .unwrap_or("unspecified error")
                .to_owned(),
        );
    }
    match body.get("error") {
        None | Some(Value::Null) => None,
        Some(err) => Some(
            body.get("errorDescription")
                .or_else(|| body.get("errorSummary"))
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| err.to_string()),
        ),
    }
}
