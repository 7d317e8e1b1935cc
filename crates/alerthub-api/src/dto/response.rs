//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_core::types::pagination::PageResponse;
use alerthub_entity::notification::{
    MedicalType, Notification, NotificationStatus, TargetType, UrgencyLevel,
};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Total item count.
    pub total: u64,
    /// Current page.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total pages.
    pub total_pages: u64,
}

impl<T: Serialize> From<PageResponse<T>> for PaginatedResponse<T> {
    fn from(page: PageResponse<T>) -> Self {
        Self {
            items: page.items,
            total: page.total_items,
            page: page.page,
            per_page: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// List view of a notification; the body, payload and attachments are only
/// served by the detail endpoint, which enforces the privacy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSummary {
    /// Notification ID.
    pub id: Uuid,
    /// Team scope.
    pub team_id: Option<Uuid>,
    /// Creator.
    pub created_by: Uuid,
    /// Severity.
    pub urgency_level: UrgencyLevel,
    /// Kind of medical event.
    pub medical_type: MedicalType,
    /// Title.
    pub title: String,
    /// Addressing mode.
    pub target_type: TargetType,
    /// Lifecycle status.
    pub status: NotificationStatus,
    /// Whether acknowledgment is required.
    pub requires_acknowledgment: bool,
    /// Recipients.
    pub total_recipients: i32,
    /// Distinct acknowledgers.
    pub acknowledged_count: i32,
    /// Highest escalation level reached.
    pub escalation_level: i32,
    /// Whether the detail view is restricted.
    pub restricted: bool,
    /// When it was sent.
    pub sent_at: Option<DateTime<Utc>>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationSummary {
    fn from(n: Notification) -> Self {
        Self {
            restricted: n.privacy.restrict_to_medical_staff || n.privacy.require_pin,
            id: n.id,
            team_id: n.team_id,
            created_by: n.created_by,
            urgency_level: n.urgency_level,
            medical_type: n.medical_type,
            title: n.title,
            target_type: n.target_type,
            status: n.status,
            requires_acknowledgment: n.requires_acknowledgment,
            total_recipients: n.total_recipients,
            acknowledged_count: n.acknowledged_count,
            escalation_level: n.escalation_level,
            sent_at: n.sent_at,
            expires_at: n.expires_at,
            created_at: n.created_at,
        }
    }
}

/// One fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyResponse {
    /// Vocabulary name.
    pub kind: String,
    /// Accepted wire values.
    pub values: Vec<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
    /// Store backend in use.
    pub store: String,
    /// Result of the database probe; absent for the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_reachable: Option<bool>,
}
