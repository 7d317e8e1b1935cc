//! Message and recipient types handed to channel senders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_entity::notification::EmergencyContact;

use crate::priority::DeliveryPriority;

/// Content of one delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Notification the message belongs to.
    pub notification_id: Uuid,
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Priority.
    pub priority: DeliveryPriority,
    /// When the notification expires.
    pub expires_at: DateTime<Utc>,
    /// Escalation level the message was sent at; 0 for the initial send.
    pub escalation_level: i32,
}

/// Someone a message is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipient {
    /// A directory user.
    User {
        /// User id.
        id: Uuid,
    },
    /// An emergency contact from the notification payload.
    EmergencyContact(EmergencyContact),
}

impl Recipient {
    /// Directory user id, if any.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User { id } => Some(*id),
            Self::EmergencyContact(_) => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::User { id } => format!("user:{id}"),
            Self::EmergencyContact(c) => format!("contact:{}", c.name),
        }
    }
}

impl From<Uuid> for Recipient {
    fn from(id: Uuid) -> Self {
        Self::User { id }
    }
}
