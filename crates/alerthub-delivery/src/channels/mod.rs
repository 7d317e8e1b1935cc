//! Delivery channel senders.
//!
//! - In-app: publishes on an in-process broadcast bus
//! - Email, SMS, push, phone: POST to a configured HTTP gateway

mod gateway;
mod in_app;

pub use gateway::GatewayChannel;
pub use in_app::{InAppChannel, InAppEvent};

use async_trait::async_trait;

use alerthub_core::result::AppResult;
use alerthub_entity::notification::DeliveryChannel;

use crate::message::{OutboundMessage, Recipient};

/// A backend able to deliver messages on one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    /// The channel this sender serves.
    fn channel(&self) -> DeliveryChannel;

    /// Whether the channel can reach this recipient at all.
    fn supports(&self, recipient: &Recipient) -> bool;

    /// Deliver one message to one recipient. Failures carry
    /// `ErrorKind::Delivery`.
    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> AppResult<()>;
}
