//! Escalation status enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Lifecycle state of an escalation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "escalation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    /// Created, not yet dispatched.
    Pending,
    /// Dispatch underway.
    InProgress,
    /// Dispatch finished on at least one channel.
    Completed,
    /// Every channel failed.
    Failed,
    /// Abandoned before dispatch.
    Cancelled,
}

vocabulary!(EscalationStatus, "escalation status", {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});
