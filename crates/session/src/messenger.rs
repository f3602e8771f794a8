use async_trait::async_trait;

use sr_domain::error::Result;

use crate::client::SessionClient;
use crate::types::{DeliveryReceipt, OutboundMessage};

/// Anything that can deliver an outbound message.
///
/// The inbound dispatcher depends on this rather than on [`SessionClient`]
/// directly so that it can be exercised without a platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt>;
}

#[async_trait]
impl Messenger for SessionClient {
    async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt> {
        self.send(&message.recipient_id, &message.text).await
    }
}
