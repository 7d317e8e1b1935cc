//! Escalation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::delivery::ChannelDeliveryResult;
use super::reason::EscalationReason;
use super::status::EscalationStatus;
use crate::notification::{DeliveryChannel, EmergencyContact};

/// One escalation level applied to a notification.
///
/// At most one exists per (notification, level).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Escalation {
    /// Unique escalation identifier.
    pub id: Uuid,
    /// The escalated notification.
    pub notification_id: Uuid,
    /// Level reached by this escalation.
    pub level: i32,
    /// Why it fired.
    pub reason: EscalationReason,
    /// Users targeted.
    pub target_user_ids: Vec<Uuid>,
    /// Roles targeted.
    pub target_roles: Vec<String>,
    /// Emergency contacts targeted.
    #[sqlx(json)]
    pub emergency_contacts: Vec<EmergencyContact>,
    /// Channels used.
    #[sqlx(json)]
    pub channels: Vec<DeliveryChannel>,
    /// Message sent.
    pub message: String,
    /// Outcome per channel.
    #[sqlx(json)]
    pub delivery_results: Vec<ChannelDeliveryResult>,
    /// Actor of a manual escalation.
    pub triggered_by: Option<Uuid>,
    /// Lifecycle state.
    pub status: EscalationStatus,
    /// When the escalation fired.
    pub created_at: DateTime<Utc>,
    /// When dispatch finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the current dispatch attempt started. An in-progress escalation
    /// whose attempt is older than the task lease is delivered again.
    pub dispatch_claimed_at: Option<DateTime<Utc>>,
}

impl Escalation {
    /// Whether any channel reported a failure.
    pub fn has_partial_failure(&self) -> bool {
        self.delivery_results.iter().any(|r| !r.success)
    }
}
