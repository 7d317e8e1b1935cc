//! In-app channel backed by a Tokio broadcast bus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use alerthub_core::result::AppResult;
use alerthub_entity::notification::DeliveryChannel;

use super::ChannelSender;
use crate::message::{OutboundMessage, Recipient};

/// A message published to an in-app user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InAppEvent {
    /// Target user.
    pub user_id: Uuid,
    /// The message.
    pub message: OutboundMessage,
}

/// Publishes messages for connected clients to pick up.
#[derive(Debug, Clone)]
pub struct InAppChannel {
    sender: broadcast::Sender<InAppEvent>,
}

impl InAppChannel {
    /// Create a bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to every in-app event.
    pub fn subscribe(&self) -> broadcast::Receiver<InAppEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ChannelSender for InAppChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::InApp
    }

    fn supports(&self, recipient: &Recipient) -> bool {
        recipient.user_id().is_some()
    }

    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> AppResult<()> {
        let Some(user_id) = recipient.user_id() else {
            return Ok(());
        };
        let event = InAppEvent {
            user_id,
            message: message.clone(),
        };
        // No subscribers means nobody is online; the notification stays
        // readable through the API.
        match self.sender.send(event) {
            Ok(receivers) => trace!(user_id = %user_id, receivers, "In-app message published"),
            Err(_) => trace!(user_id = %user_id, "In-app message published with no subscribers"),
        }
        Ok(())
    }
}
