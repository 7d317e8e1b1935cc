//! Notification status enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Lifecycle state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Scheduled for a future send.
    Draft,
    /// Ready to send.
    Pending,
    /// Dispatch attempted on all configured channels.
    Delivered,
    /// Acknowledgment policy satisfied.
    Acknowledged,
    /// At least one escalation fired.
    Escalated,
    /// Closed manually.
    Resolved,
    /// Passed its expiry without resolution.
    Expired,
}

vocabulary!(NotificationStatus, "notification status", {
    Draft => "draft",
    Pending => "pending",
    Delivered => "delivered",
    Acknowledged => "acknowledged",
    Escalated => "escalated",
    Resolved => "resolved",
    Expired => "expired",
});

impl NotificationStatus {
    /// Resolved and expired notifications never change again.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Resolved | Self::Expired)
    }

    /// States that still count as "active" for listings.
    pub fn is_active(&self) -> bool {
        !self.is_final()
    }

    /// Whether the notification can still pass its expiry.
    pub fn can_expire(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Pending | Self::Delivered | Self::Escalated
        )
    }
}
