//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use alerthub_database::repositories::NotificationFilter;
use alerthub_entity::acknowledgment::AcknowledgmentMethod;
use alerthub_entity::escalation::EscalationReason;
use alerthub_entity::notification::{
    Attachment, DeliveryChannel, EscalationLevelPolicy, MedicalPayload, MedicalType,
    PrivacySettings, TargetType, UrgencyLevel,
};
use alerthub_service::acknowledgment::AcknowledgeRequest;
use alerthub_service::escalation::ManualEscalation;
use alerthub_service::notification::CreateNotification;

/// Most ids accepted by one bulk acknowledgment.
pub const MAX_BULK_ACKNOWLEDGMENTS: u64 = 100;

/// Create notification request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    /// Optional team scope.
    #[serde(default)]
    pub team_id: Option<Uuid>,
    /// Severity.
    pub urgency_level: UrgencyLevel,
    /// Kind of medical event.
    pub medical_type: MedicalType,
    /// Short title.
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    /// Message body.
    #[validate(length(min = 1, max = 10000, message = "Message must be 1-10000 characters"))]
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
    #[validate(length(max = 1000))]
    pub recipient_ids: Vec<Uuid>,
    /// Channels to deliver on.
    #[validate(length(min = 1, message = "At least one delivery channel is required"))]
    pub delivery_channels: Vec<DeliveryChannel>,
    /// Opaque per-channel configuration.
    #[serde(default)]
    pub channel_config: Value,
    /// Whether recipients must acknowledge.
    #[serde(default = "default_true")]
    pub requires_acknowledgment: bool,
    /// Minutes before the first escalation.
    #[serde(default)]
    #[validate(range(min = 1, max = 10080))]
    pub acknowledgment_timeout_minutes: Option<i32>,
    /// Users who must each acknowledge.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub required_acknowledgers: Vec<Uuid>,
    /// Minimum number of acknowledgments.
    #[serde(default = "default_min_acknowledgments")]
    #[validate(range(min = 1))]
    pub min_acknowledgments_required: i32,
    /// Whether timers escalate the notification.
    #[serde(default)]
    pub enable_escalation: bool,
    /// Ordered escalation levels.
    #[serde(default)]
    #[validate(length(max = 10))]
    pub escalation_policy: Vec<EscalationLevelPolicy>,
    /// Attached files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Access restrictions.
    #[serde(default)]
    pub privacy: PrivacySettings,
    /// Plain-text access PIN.
    #[serde(default)]
    #[validate(length(min = 4, max = 12, message = "PIN must be 4-12 characters"))]
    pub access_pin: Option<String>,
    /// Send later instead of now.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_min_acknowledgments() -> i32 {
    1
}

impl From<CreateNotificationRequest> for CreateNotification {
    fn from(req: CreateNotificationRequest) -> Self {
        Self {
            team_id: req.team_id,
            urgency_level: req.urgency_level,
            medical_type: req.medical_type,
            title: req.title,
            message: req.message,
            payload: req.payload,
            target_type: req.target_type,
            target_id: req.target_id,
            recipient_ids: req.recipient_ids,
            delivery_channels: req.delivery_channels,
            channel_config: req.channel_config,
            requires_acknowledgment: req.requires_acknowledgment,
            acknowledgment_timeout_minutes: req.acknowledgment_timeout_minutes,
            required_acknowledgers: req.required_acknowledgers,
            min_acknowledgments_required: req.min_acknowledgments_required,
            enable_escalation: req.enable_escalation,
            escalation_policy: req.escalation_policy,
            attachments: req.attachments,
            privacy: req.privacy,
            access_pin: req.access_pin,
            scheduled_for: req.scheduled_for,
            expires_at: req.expires_at,
        }
    }
}

/// Acknowledge request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AcknowledgeNotificationRequest {
    /// How the user acknowledged.
    #[serde(default)]
    pub method: AcknowledgmentMethod,
    /// Optional reply.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    /// Device metadata.
    #[serde(default)]
    pub device_info: Option<Value>,
    /// Free-form location.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub location: Option<String>,
    /// The user was reached as an emergency contact.
    #[serde(default)]
    pub is_emergency_contact: bool,
}

impl From<AcknowledgeNotificationRequest> for AcknowledgeRequest {
    fn from(req: AcknowledgeNotificationRequest) -> Self {
        Self {
            method: req.method,
            message: req.message,
            device_info: req.device_info,
            location: req.location,
            is_emergency_contact: req.is_emergency_contact,
        }
    }
}

/// Bulk acknowledge request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkAcknowledgeRequest {
    /// Notifications to acknowledge.
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 notification ids"))]
    pub notification_ids: Vec<Uuid>,
    /// Details applied to every acknowledgment.
    #[serde(default)]
    #[validate(nested)]
    pub acknowledgment: AcknowledgeNotificationRequest,
}

/// Manual escalation request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EscalateRequest {
    /// Reason recorded on the escalation; `manual` when omitted.
    #[serde(default)]
    pub reason: Option<EscalationReason>,
    /// Users to notify instead of the policy's targets.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub target_users: Vec<Uuid>,
    /// Roles to notify instead of the policy's targets.
    #[serde(default)]
    pub target_roles: Vec<String>,
    /// Also reach the payload's emergency contacts.
    #[serde(default)]
    pub use_emergency_contacts: bool,
    /// Channels to use.
    #[serde(default)]
    pub channels: Option<Vec<DeliveryChannel>>,
    /// Message to send.
    #[serde(default)]
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
}

impl From<EscalateRequest> for ManualEscalation {
    fn from(req: EscalateRequest) -> Self {
        Self {
            reason: req.reason.unwrap_or(EscalationReason::Manual),
            target_users: req.target_users,
            target_roles: req.target_roles,
            use_emergency_contacts: req.use_emergency_contacts,
            channels: req.channels,
            message: req.message,
        }
    }
}

/// Resolve request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResolveRequest {
    /// Resolution notes.
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Filters for the active notification list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationListQuery {
    /// Only this urgency level.
    pub urgency_level: Option<UrgencyLevel>,
    /// Only this medical type.
    pub medical_type: Option<MedicalType>,
    /// Only this target type.
    pub target_type: Option<TargetType>,
    /// Only notifications that do (or do not) require acknowledgment.
    pub requires_acknowledgment: Option<bool>,
    /// Only notifications created by this user.
    pub created_by: Option<Uuid>,
}

impl From<NotificationListQuery> for NotificationFilter {
    fn from(q: NotificationListQuery) -> Self {
        Self {
            urgency_level: q.urgency_level,
            medical_type: q.medical_type,
            target_type: q.target_type,
            requires_acknowledgment: q.requires_acknowledgment,
            created_by: q.created_by,
        }
    }
}

/// Compliance report window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReportQuery {
    /// Window start, inclusive.
    pub start: DateTime<Utc>,
    /// Window end, exclusive.
    pub end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rules() {
        let mut req: CreateNotificationRequest = serde_json::from_value(serde_json::json!({
            "urgency_level": "urgent",
            "medical_type": "treatment_required",
            "title": "Physio",
            "message": "Report to the physio room",
            "target_type": "player",
            "target_id": Uuid::new_v4(),
            "delivery_channels": ["in_app"]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        req.access_pin = Some("12".into());
        assert!(req.validate().is_err());

        req.access_pin = None;
        req.delivery_channels.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bulk_request_limits() {
        let req = BulkAcknowledgeRequest {
            notification_ids: vec![],
            acknowledgment: AcknowledgeNotificationRequest::default(),
        };
        assert!(req.validate().is_err());

        let req = BulkAcknowledgeRequest {
            notification_ids: (0..=MAX_BULK_ACKNOWLEDGMENTS).map(|_| Uuid::new_v4()).collect(),
            acknowledgment: AcknowledgeNotificationRequest::default(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_escalate_defaults_to_manual() {
        let manual = ManualEscalation::from(EscalateRequest::default());
        assert_eq!(manual.reason, EscalationReason::Manual);
        assert!(manual.target_users.is_empty());
    }
}
