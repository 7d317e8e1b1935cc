//! Urgency level enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Severity of a notification.
///
/// Levels are ordered: Urgent < Critical < Emergency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "urgency_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// Needs attention soon.
    Urgent,
    /// Needs attention now.
    Critical,
    /// Life-threatening situation.
    Emergency,
}

vocabulary!(UrgencyLevel, "urgency level", {
    Urgent => "urgent",
    Critical => "critical",
    Emergency => "emergency",
});
