//! Durable escalation timer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::vocabulary;

/// Execution state of an escalation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "escalation_task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its due time.
    Pending,
    /// Claimed by a worker.
    Running,
    /// Fired (or found nothing to do).
    Completed,
    /// Cancelled before firing.
    Cancelled,
}

vocabulary!(TaskStatus, "task status", {
    Pending => "pending",
    Running => "running",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl TaskStatus {
    /// Whether the task still holds the notification's single timer slot.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

/// A scheduled escalation to `target_level`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EscalationTask {
    /// Unique task identifier.
    pub id: Uuid,
    /// The notification to escalate.
    pub notification_id: Uuid,
    /// The level this task escalates to.
    pub target_level: i32,
    /// When the task fires.
    pub due_at: DateTime<Utc>,
    /// Execution state.
    pub status: TaskStatus,
    /// Failed fire attempts.
    pub attempts: i32,
    /// Last failure message.
    pub last_error: Option<String>,
    /// When a worker claimed the task.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl EscalationTask {
    /// Create a pending task.
    pub fn new(notification_id: Uuid, target_level: i32, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_id,
            target_level,
            due_at,
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
