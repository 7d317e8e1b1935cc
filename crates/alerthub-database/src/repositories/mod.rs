//! Repository traits and their PostgreSQL implementations.
//!
//! Writes to a notification carry an optimistic version check: the caller
//! passes the row it read, and the update fails with `ErrorKind::Conflict`
//! when another writer got there first.

pub mod acknowledgment;
pub mod escalation;
pub mod notification;
pub mod task;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use alerthub_core::error::{AppError, ErrorKind};
use alerthub_core::result::AppResult;
use alerthub_core::types::pagination::{PageRequest, PageResponse};
use alerthub_entity::acknowledgment::Acknowledgment;
use alerthub_entity::escalation::{Escalation, EscalationTask};
use alerthub_entity::notification::{MedicalType, Notification, TargetType, UrgencyLevel};

pub use acknowledgment::PgAcknowledgmentRepository;
pub use escalation::PgEscalationRepository;
pub use notification::PgNotificationRepository;
pub use task::PgEscalationTaskRepository;

/// Filters for listing active notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
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

impl NotificationFilter {
    /// Check a notification against the filter.
    pub fn matches(&self, n: &Notification) -> bool {
        self.urgency_level.is_none_or(|v| v == n.urgency_level)
            && self.medical_type.is_none_or(|v| v == n.medical_type)
            && self.target_type.is_none_or(|v| v == n.target_type)
            && self
                .requires_acknowledgment
                .is_none_or(|v| v == n.requires_acknowledgment)
            && self.created_by.is_none_or(|v| v == n.created_by)
    }
}

/// Persistence for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + Debug + 'static {
    /// Insert a new notification.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    /// Find a notification by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Persist every mutable field if the stored version still equals
    /// `notification.version`. Returns the stored row with the bumped version.
    async fn update(&self, notification: &Notification) -> AppResult<Notification>;

    /// List non-final notifications of an organization, newest first.
    async fn list_active(
        &self,
        organization_id: Uuid,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Notifications of an organization created in `[start, end)`.
    async fn find_created_between(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>>;

    /// Drafts whose scheduled send time has passed.
    async fn find_due_drafts(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>>;

    /// Non-final notifications past their expiry.
    async fn find_expirable(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>>;

    /// Final notifications with an auto-delete setting that are not yet redacted.
    async fn find_redaction_candidates(&self, limit: u32) -> AppResult<Vec<Notification>>;
}

/// Persistence for acknowledgments.
#[async_trait]
pub trait AcknowledgmentStore: Send + Sync + Debug + 'static {
    /// Insert an acknowledgment. A second acknowledgment for the same
    /// (notification, user) fails with `ErrorKind::Conflict`.
    async fn insert(&self, ack: &Acknowledgment) -> AppResult<Acknowledgment>;

    /// Find the acknowledgment of a user for a notification.
    async fn find_by_user(&self, notification_id: Uuid, user_id: Uuid) -> AppResult<Option<Acknowledgment>>;

    /// All acknowledgments of a notification, oldest first.
    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Acknowledgment>>;

    /// All acknowledgments of several notifications.
    async fn list_by_notifications(&self, notification_ids: &[Uuid]) -> AppResult<Vec<Acknowledgment>>;
}

/// Persistence for escalation records.
#[async_trait]
pub trait EscalationStore: Send + Sync + Debug + 'static {
    /// Insert an escalation. A second escalation for the same
    /// (notification, level) fails with `ErrorKind::Conflict`.
    async fn insert(&self, escalation: &Escalation) -> AppResult<Escalation>;

    /// Record the final status, delivery results and completion time.
    async fn finish(&self, escalation: &Escalation) -> AppResult<()>;

    /// All escalations of a notification, by level.
    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Escalation>>;

    /// All escalations of several notifications.
    async fn list_by_notifications(&self, notification_ids: &[Uuid]) -> AppResult<Vec<Escalation>>;

    /// Claim up to `limit` in-progress escalations whose dispatch started
    /// before `lease_cutoff`, stamping them with `now`.
    async fn claim_interrupted(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Escalation>>;
}

/// Persistence for durable escalation timers.
#[async_trait]
pub trait EscalationTaskStore: Send + Sync + Debug + 'static {
    /// Insert a task. Fails with `ErrorKind::Conflict` if the notification
    /// already has an outstanding task.
    async fn insert(&self, task: &EscalationTask) -> AppResult<EscalationTask>;

    /// The pending or running task of a notification.
    async fn find_outstanding(&self, notification_id: Uuid) -> AppResult<Option<EscalationTask>>;

    /// Cancel the outstanding task of a notification. Returns how many were cancelled.
    async fn cancel_outstanding(&self, notification_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Claim up to `limit` tasks: pending tasks due by `now`, plus running
    /// tasks claimed before `lease_cutoff`.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<EscalationTask>>;

    /// Atomically retire the outstanding task of a notification and arm
    /// `next`. The `fired` task is marked completed; any other outstanding
    /// task is cancelled.
    async fn rearm(
        &self,
        notification_id: Uuid,
        fired: Option<Uuid>,
        next: Option<&EscalationTask>,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Mark a task completed.
    async fn complete(&self, task_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Return a task to pending with a new due time after a failed attempt.
    async fn reschedule(
        &self,
        task_id: Uuid,
        due_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Map a sqlx error, turning unique violations into conflicts.
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::with_source(ErrorKind::Conflict, format!("Duplicate record on {what}"), e);
    }
    AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e)
}

/// Map a sqlx read error.
pub(crate) fn map_read_error(e: sqlx::Error, what: &str) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e)
}
