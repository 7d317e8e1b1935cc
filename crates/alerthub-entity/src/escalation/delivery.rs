//! Per-channel delivery outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::DeliveryChannel;

/// Result of dispatching one message on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDeliveryResult {
    /// The channel.
    pub channel: DeliveryChannel,
    /// Whether at least one recipient was reached and none failed.
    pub success: bool,
    /// Sends attempted.
    pub attempted: u32,
    /// Sends that succeeded.
    pub delivered: u32,
    /// Sends that failed.
    pub failed: u32,
    /// Recipients the channel cannot reach.
    pub skipped: u32,
    /// First error seen on the channel.
    pub error: Option<String>,
    /// When dispatch on the channel finished.
    pub timestamp: DateTime<Utc>,
}

impl ChannelDeliveryResult {
    /// Whether any send on the channel succeeded.
    pub fn reached_anyone(&self) -> bool {
        self.delivered > 0
    }
}
