use serde::Serialize;

/// Structured trace events emitted across all SessionRelay crates.
///
/// Cookie values never appear in an event; only keys, counts and the
/// identity id.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionLoaded {
        source: String,
        token_count: usize,
        identity_id: Option<String>,
        has_security_token: bool,
    },
    PlatformCall {
        endpoint: String,
        tier: String,
        status: u16,
        duration_ms: u64,
    },
    DeliveryCompleted {
        recipient: String,
        method: String,
        duration_ms: u64,
    },
    DeliveryFailed {
        recipient: String,
        reason: String,
    },
    InboundDispatched {
        event_id: String,
        sender_id: String,
        text_chars: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sr_event");
    }
}
