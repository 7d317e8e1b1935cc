//! Read models returned by the lifecycle manager.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use alerthub_entity::acknowledgment::Acknowledgment;
use alerthub_entity::escalation::{ChannelDeliveryResult, Escalation};
use alerthub_entity::notification::Notification;

/// Acknowledgment progress of a notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcknowledgmentProgress {
    /// Distinct acknowledgers.
    pub acknowledged: i32,
    /// Recipients.
    pub total_recipients: i32,
    /// Minimum acknowledgments required.
    pub min_required: i32,
    /// Required acknowledgers who have not acknowledged yet.
    pub outstanding_required: Vec<Uuid>,
    /// Share of recipients that acknowledged, 0-100.
    pub percentage: f64,
    /// Whether the acknowledgment policy is satisfied.
    pub fully_acknowledged: bool,
}

impl AcknowledgmentProgress {
    /// Compute progress from the notification and its acknowledgers.
    pub fn compute(notification: &Notification, acknowledged_by: &HashSet<Uuid>) -> Self {
        let acknowledged = i32::try_from(acknowledged_by.len()).unwrap_or(i32::MAX);
        let percentage = if notification.total_recipients > 0 {
            f64::from(acknowledged) / f64::from(notification.total_recipients) * 100.0
        } else {
            0.0
        };
        Self {
            acknowledged,
            total_recipients: notification.total_recipients,
            min_required: notification.min_acknowledgments_required,
            outstanding_required: notification
                .required_acknowledgers
                .iter()
                .filter(|id| !acknowledged_by.contains(id))
                .copied()
                .collect(),
            percentage,
            fully_acknowledged: notification.is_fully_acknowledged(acknowledged_by),
        }
    }
}

/// Full detail view of a notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationDetail {
    /// The notification.
    pub notification: Notification,
    /// Acknowledgment progress.
    pub progress: AcknowledgmentProgress,
    /// Acknowledgments, oldest first.
    pub acknowledgments: Vec<Acknowledgment>,
    /// Escalation history, by level.
    pub escalations: Vec<Escalation>,
}

/// Result of creating (and possibly sending) a notification.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// The stored notification.
    pub notification: Notification,
    /// Per-channel results of the initial send; empty for scheduled sends.
    pub delivery: Vec<ChannelDeliveryResult>,
    /// Whether any channel failed.
    pub partial_failure: bool,
}
