//! Delivery channel enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Outbound channel a notification can be delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// In-application message.
    InApp,
    /// Email.
    Email,
    /// Text message.
    Sms,
    /// Mobile push notification.
    Push,
    /// Voice call.
    Phone,
}

vocabulary!(DeliveryChannel, "delivery channel", {
    InApp => "in_app",
    Email => "email",
    Sms => "sms",
    Push => "push",
    Phone => "phone",
});

impl DeliveryChannel {
    /// Whether the channel can reach someone known only by phone number.
    pub fn reaches_phone_numbers(&self) -> bool {
        matches!(self, Self::Sms | Self::Phone)
    }
}
