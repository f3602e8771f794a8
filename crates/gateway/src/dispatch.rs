//! Inbound event dispatch: turns webhook message events into replies.
//!
//! The page webhook payload looks like:
//!
//! ```json
//! { "object": "page",
//!   "entry": [ { "messaging": [
//!       { "sender": {"id": "123"}, "recipient": {"id": "456"},
//!         "message": {"mid": "m_1", "text": "hi"} } ] } ] }
//! ```
//!
//! Every messaging event that carries a `message` becomes one
//! [`InboundEvent`].  Replies are delivered in the background so the
//! webhook can acknowledge immediately; a failed reply is logged and
//! dropped.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use sr_domain::trace::TraceEvent;
use sr_session::{DeliveryMethod, Messenger, OutboundMessage};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Payload shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `object` value identifying page messaging payloads.
pub const PAGE_OBJECT: &str = "page";

#[derive(Debug, Deserialize)]
pub struct PagePayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PageEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    #[serde(default)]
    pub sender: Option<Participant>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: Option<String>,
}

/// A received message, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub text: String,
}

impl PagePayload {
    pub fn is_page(&self) -> bool {
        self.object.as_deref() == Some(PAGE_OBJECT)
    }

    /// Every messaging event with a `message` field, in payload order.
    /// Events without a sender cannot be answered and are skipped.
    pub fn into_events(self) -> Vec<InboundEvent> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.messaging)
            .filter_map(|event| {
                let message = event.message?;
                let Some(sender) = event.sender else {
                    tracing::warn!("message event without sender, skipping");
                    return None;
                };
                Some(InboundEvent {
                    sender_id: sender.id,
                    text: message.text.unwrap_or_default(),
                })
            })
            .collect()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Answers inbound events through a [`Messenger`].
pub struct EventDispatcher {
    messenger: Arc<dyn Messenger>,
}

impl EventDispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Reply to one event.  Returns the tier that delivered the reply, or
    /// `None` when delivery failed (the failure is logged, not raised).
    pub async fn on_inbound_event(&self, event: InboundEvent) -> Option<DeliveryMethod> {
        let event_id = Uuid::new_v4().to_string();
        TraceEvent::InboundDispatched {
            event_id: event_id.clone(),
            sender_id: event.sender_id.clone(),
            text_chars: event.text.chars().count(),
        }
        .emit();

        let reply = OutboundMessage::new(event.sender_id, reply_text(&event.text, Local::now()));
        let span = tracing::info_span!("inbound_reply", event_id = %event_id);

        async {
            match self.messenger.deliver(&reply).await {
                Ok(receipt) => {
                    tracing::info!(
                        sender_id = %reply.recipient_id,
                        method = %receipt.method,
                        "auto-reply sent"
                    );
                    Some(receipt.method)
                }
                Err(e) => {
                    tracing::error!(
                        sender_id = %reply.recipient_id,
                        error = %e,
                        "failed to send auto-reply"
                    );
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Reply in the background.
    pub fn spawn(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<Option<DeliveryMethod>> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.on_inbound_event(event).await })
    }
}

/// Echo reply: the received text plus the local time of the reply.
pub fn reply_text(text: &str, at: DateTime<Local>) -> String {
    format!("You said: \"{text}\"\n\nTime: {}", at.format("%H:%M:%S"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use sr_domain::error::{Error, Result, TransportFailure};
    use sr_session::DeliveryReceipt;
    use std::sync::Mutex;

    /// Records every delivery; fails when `fail` is set.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutboundMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Messenger for Recorder {
        async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(Error::Delivery(TransportFailure::network("connection reset")));
            }
            Ok(DeliveryReceipt {
                success: true,
                method: DeliveryMethod::Primary,
                recipient: message.recipient_id.clone(),
                message: message.text.clone(),
                response: serde_json::Value::Null,
            })
        }
    }

    #[test]
    fn reply_echoes_text_with_time() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap();
        assert_eq!(reply_text("hi", at), "You said: \"hi\"\n\nTime: 14:03:09");
    }

    #[test]
    fn payload_yields_only_message_events() {
        let payload: PagePayload = serde_json::from_value(json!({
            "object": "page",
            "entry": [
                { "messaging": [
                    { "sender": {"id": "1"}, "message": {"text": "first"} },
                    { "sender": {"id": "2"}, "delivery": {"watermark": 1} }
                ]},
                { "messaging": [
                    { "sender": {"id": "3"}, "message": {"attachments": []} },
                    { "message": {"text": "orphan"} }
                ]},
                { "id": "page-without-messaging" }
            ]
        }))
        .unwrap();

        assert!(payload.is_page());
        let events = payload.into_events();
        assert_eq!(
            events,
            vec![
                InboundEvent { sender_id: "1".into(), text: "first".into() },
                InboundEvent { sender_id: "3".into(), text: String::new() },
            ]
        );
    }

    #[test]
    fn non_page_object_is_detected() {
        let payload: PagePayload =
            serde_json::from_value(json!({"object": "instagram", "entry": []})).unwrap();
        assert!(!payload.is_page());
    }

    #[tokio::test]
    async fn dispatcher_replies_to_sender() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = EventDispatcher::new(recorder.clone());

        let method = dispatcher
            .on_inbound_event(InboundEvent {
                sender_id: "42".into(),
                text: "ping".into(),
            })
            .await;

        assert_eq!(method, Some(DeliveryMethod::Primary));
        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, "42");
        assert!(sent[0].text.starts_with("You said: \"ping\""));
    }

    #[tokio::test]
    async fn dispatcher_swallows_delivery_failure() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let dispatcher = Arc::new(EventDispatcher::new(recorder.clone()));

        let handle = dispatcher.spawn(InboundEvent {
            sender_id: "42".into(),
            text: "ping".into(),
        });

        assert_eq!(handle.await.unwrap(), None);
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);
    }
}
