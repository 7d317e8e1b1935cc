//! Input for creating a notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_entity::notification::{
    Attachment, DeliveryChannel, EscalationLevelPolicy, MedicalPayload, MedicalType,
    PrivacySettings, TargetType, UrgencyLevel,
};

/// Everything needed to create a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Optional team scope.
    #[serde(default)]
    pub team_id: Option<Uuid>,
    /// Severity.
    pub urgency_level: UrgencyLevel,
    /// Kind of medical event.
    pub medical_type: MedicalType,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Structured medical details.
    #[serde(default)]
    pub payload: MedicalPayload,
    /// How recipients are addressed.
    pub target_type: TargetType,
    /// Player, team or organization id.
    #[serde(default)]
    pub target_id: Option<Uuid>,
    /// Explicit recipients for custom groups.
    #[serde(default)]
    pub recipient_ids: Vec<Uuid>,
    /// Channels to deliver on.
    pub delivery_channels: Vec<DeliveryChannel>,
    /// Opaque per-channel configuration.
    #[serde(default)]
    pub channel_config: serde_json::Value,
    /// Whether recipients must acknowledge.
    #[serde(default = "default_true")]
    pub requires_acknowledgment: bool,
    /// Minutes before the first escalation.
    #[serde(default)]
    pub acknowledgment_timeout_minutes: Option<i32>,
    /// Users who must each acknowledge.
    #[serde(default)]
    pub required_acknowledgers: Vec<Uuid>,
    /// Minimum number of acknowledgments.
    #[serde(default = "default_min_acknowledgments")]
    pub min_acknowledgments_required: i32,
    /// Whether timers escalate the notification.
    #[serde(default)]
    pub enable_escalation: bool,
    /// Ordered escalation levels.
    #[serde(default)]
    pub escalation_policy: Vec<EscalationLevelPolicy>,
    /// Attached files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Access restrictions.
    #[serde(default)]
    pub privacy: PrivacySettings,
    /// Plain-text access PIN, hashed before storage.
    #[serde(default)]
    pub access_pin: Option<String>,
    /// Send later instead of now.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry; defaults to the configured lifetime.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_min_acknowledgments() -> i32 {
    1
}

impl CreateNotification {
    /// Check the fields that do not depend on the directory.
    pub fn validate(&self, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::validation("message is required"));
        }
        if self.delivery_channels.is_empty() {
            return Err(AppError::validation(
                "at least one delivery channel is required",
            ));
        }
        if self.min_acknowledgments_required < 1 {
            return Err(AppError::validation(
                "min_acknowledgments_required must be at least 1",
            ));
        }
        if matches!(self.acknowledgment_timeout_minutes, Some(m) if m < 1) {
            return Err(AppError::validation(
                "acknowledgment_timeout_minutes must be at least 1",
            ));
        }
        if expires_at <= now {
            return Err(AppError::validation("expires_at must be in the future"));
        }
        if let Some(at) = self.scheduled_for
            && at >= expires_at
        {
            return Err(AppError::validation(
                "scheduled_for must be before expires_at",
            ));
        }
        match self.target_type {
            TargetType::CustomGroup if self.recipient_ids.is_empty() => {
                return Err(AppError::validation(
                    "custom_group targets need at least one recipient id",
                ));
            }
            TargetType::Player if self.target_id.is_none() => {
                return Err(AppError::validation("player targets need a target_id"));
            }
            _ => {}
        }
        for (index, level) in self.escalation_policy.iter().enumerate() {
            level.validate(index + 1)?;
        }
        if self.privacy.require_pin && self.access_pin.is_none() {
            return Err(AppError::validation(
                "an access_pin is required when privacy.require_pin is set",
            ));
        }
        if matches!(self.privacy.auto_delete_after_hours, Some(h) if h < 1) {
            return Err(AppError::validation(
                "privacy.auto_delete_after_hours must be at least 1",
            ));
        }
        Ok(())
    }
}
