//! Acknowledgment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::method::AcknowledgmentMethod;

/// A recipient's confirmation that they saw a notification.
///
/// At most one exists per (notification, user).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Acknowledgment {
    /// Unique acknowledgment identifier.
    pub id: Uuid,
    /// The acknowledged notification.
    pub notification_id: Uuid,
    /// The acknowledging user.
    pub user_id: Uuid,
    /// Display name at acknowledgment time.
    pub user_name: String,
    /// Role at acknowledgment time.
    pub user_role: String,
    /// How the acknowledgment was made.
    pub method: AcknowledgmentMethod,
    /// Optional reply text.
    pub message: Option<String>,
    /// Device metadata reported by the client.
    pub device_info: Option<serde_json::Value>,
    /// Location reported by the client.
    pub location: Option<String>,
    /// Seconds between the send and this acknowledgment.
    pub response_time_seconds: Option<i64>,
    /// Escalation level in force when acknowledged.
    pub escalation_level: i32,
    /// Whether the user acted as an emergency contact.
    pub is_emergency_contact: bool,
    /// When the acknowledgment was recorded.
    pub created_at: DateTime<Utc>,
}
