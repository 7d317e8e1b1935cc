//! Acknowledgment tracker.
//!
//! Acknowledgments are append-only and unique per (notification, user).
//! Every counter on the notification is recomputed from those records while
//! holding the notification's lock, so a repeated or concurrent
//! acknowledgment can never double count.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use alerthub_core::error::{AppError, ErrorKind};
use alerthub_core::result::AppResult;
use alerthub_entity::acknowledgment::{Acknowledgment, AcknowledgmentMethod};
use alerthub_entity::notification::{Notification, NotificationStatus};

use crate::access::ensure_same_organization;
use crate::context::RequestContext;
use crate::deps::ServiceDeps;
use crate::notification::targeting::dedup;
use crate::retry::retry_on_conflict;

/// Details supplied with an acknowledgment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    /// How the user acknowledged.
    #[serde(default)]
    pub method: AcknowledgmentMethod,
    /// Optional reply.
    #[serde(default)]
    pub message: Option<String>,
    /// Device metadata reported by the client.
    #[serde(default)]
    pub device_info: Option<Value>,
    /// Free-form location.
    #[serde(default)]
    pub location: Option<String>,
    /// The user was reached as an emergency contact.
    #[serde(default)]
    pub is_emergency_contact: bool,
}

/// Result of an acknowledgment.
#[derive(Debug, Clone, Serialize)]
pub struct AckOutcome {
    /// The stored acknowledgment.
    pub acknowledgment: Acknowledgment,
    /// False when the user had already acknowledged.
    pub created: bool,
    /// Notification status afterwards.
    pub status: NotificationStatus,
    /// Distinct acknowledgers afterwards.
    pub acknowledged_count: i32,
    /// Whether the acknowledgment policy is satisfied.
    pub fully_acknowledged: bool,
}

/// Per-notification result of a bulk acknowledgment.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAckResult {
    /// The notification.
    pub notification_id: Uuid,
    /// Whether the acknowledgment was recorded or already existed.
    pub success: bool,
    /// The acknowledgment, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<Acknowledgment>,
    /// Error kind, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Records acknowledgments and applies the fully-acknowledged transition.
#[derive(Debug, Clone)]
pub struct AcknowledgmentTracker {
    deps: ServiceDeps,
}

impl AcknowledgmentTracker {
    /// Creates a new acknowledgment tracker.
    pub fn new(deps: ServiceDeps) -> Self {
        Self { deps }
    }

    /// Acknowledge a notification as the acting user.
    ///
    /// Idempotent: a second call returns the first acknowledgment unchanged.
    pub async fn acknowledge(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
        request: &AcknowledgeRequest,
    ) -> AppResult<AckOutcome> {
        retry_on_conflict(self.deps.conflict_retries, move || {
            self.acknowledge_locked(ctx, notification_id, request)
        })
        .await
    }

    /// Acknowledge several notifications, reporting each outcome separately.
    pub async fn bulk_acknowledge(
        &self,
        ctx: &RequestContext,
        notification_ids: &[Uuid],
        request: &AcknowledgeRequest,
    ) -> Vec<BulkAckResult> {
        let ids = dedup(notification_ids.iter().copied());
        let outcomes = join_all(ids.iter().map(|id| self.acknowledge(ctx, *id, request))).await;

        ids.into_iter()
            .zip(outcomes)
            .map(|(notification_id, outcome)| match outcome {
                Ok(outcome) => BulkAckResult {
                    notification_id,
                    success: true,
                    acknowledgment: Some(outcome.acknowledgment),
                    error_kind: None,
                    error: None,
                },
                Err(e) => BulkAckResult {
                    notification_id,
                    success: false,
                    acknowledgment: None,
                    error_kind: Some(e.kind),
                    error: Some(e.message),
                },
            })
            .collect()
    }

    async fn acknowledge_locked(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
        request: &AcknowledgeRequest,
    ) -> AppResult<AckOutcome> {
        let _guard = self.deps.locks.lock(notification_id).await;

        let notification = self.deps.load(notification_id).await?;
        ensure_same_organization(&notification, ctx)?;
        let notification = self.deps.expire_if_due(notification).await?;

        if let Some(existing) = self
            .deps
            .stores
            .acknowledgments
            .find_by_user(notification_id, ctx.user_id)
            .await?
        {
            let notification = self.reconcile(notification).await?;
            debug!(
                notification_id = %notification_id,
                user_id = %ctx.user_id,
                "Repeated acknowledgment"
            );
            return Ok(outcome(existing, false, &notification));
        }

        if notification.is_final() {
            return Err(AppError::already_final(format!(
                "Notification {notification_id} is {}",
                notification.status
            )));
        }
        if notification.status == NotificationStatus::Draft {
            return Err(AppError::validation(format!(
                "Notification {notification_id} has not been sent yet"
            )));
        }
        if !notification.is_recipient(ctx.user_id) {
            return Err(AppError::authorization(
                "Only recipients can acknowledge this notification",
            ));
        }

        let now = self.deps.clock.now();
        let (user_name, user_role) = match self.deps.directory.find_user(ctx.user_id).await? {
            Some(user) => (user.display_name, user.role),
            None => (ctx.user_id.to_string(), ctx.role.to_string()),
        };

        let acknowledgment = self
            .deps
            .stores
            .acknowledgments
            .insert(&Acknowledgment {
                id: Uuid::new_v4(),
                notification_id,
                user_id: ctx.user_id,
                user_name,
                user_role,
                method: request.method,
                message: request.message.clone(),
                device_info: request.device_info.clone(),
                location: request.location.clone(),
                response_time_seconds: response_time(notification.sent_at, now),
                escalation_level: notification.escalation_level,
                is_emergency_contact: request.is_emergency_contact,
                created_at: now,
            })
            .await?;

        let notification = self.reconcile(notification).await?;
        info!(
            notification_id = %notification_id,
            user_id = %ctx.user_id,
            method = %request.method,
            acknowledged = notification.acknowledged_count,
            status = %notification.status,
            "Notification acknowledged"
        );
        Ok(outcome(acknowledgment, true, &notification))
    }

    /// Bring the notification's counters and status in line with its
    /// acknowledgment records. Must be called while holding the lock.
    async fn reconcile(&self, mut notification: Notification) -> AppResult<Notification> {
        if notification.is_final() {
            return Ok(notification);
        }

        let (acknowledgments, acknowledged_by) =
            self.deps.acknowledgments(notification.id).await?;
        let count = i32::try_from(acknowledged_by.len()).unwrap_or(i32::MAX);
        let first = acknowledgments.iter().map(|a| a.created_at).min();
        let newly_satisfied = notification.status != NotificationStatus::Acknowledged
            && notification.is_fully_acknowledged(&acknowledged_by);

        let stale = count > notification.acknowledged_count
            || (notification.first_acknowledged_at.is_none() && first.is_some())
            || newly_satisfied;
        if !stale {
            return Ok(notification);
        }

        let now = self.deps.clock.now();
        notification.acknowledged_count = count.max(notification.acknowledged_count);
        if notification.first_acknowledged_at.is_none() {
            notification.first_acknowledged_at = first;
        }
        if newly_satisfied {
            notification.status = NotificationStatus::Acknowledged;
            notification.fully_acknowledged_at = Some(now);
        }
        notification.updated_at = now;
        let notification = self.deps.stores.notifications.update(&notification).await?;

        if newly_satisfied {
            let cancelled = self
                .deps
                .stores
                .tasks
                .cancel_outstanding(notification.id, now)
                .await?;
            info!(
                notification_id = %notification.id,
                acknowledged = count,
                level = notification.escalation_level,
                cancelled_tasks = cancelled,
                "Notification fully acknowledged"
            );
        }
        Ok(notification)
    }
}

fn outcome(acknowledgment: Acknowledgment, created: bool, notification: &Notification) -> AckOutcome {
    AckOutcome {
        acknowledgment,
        created,
        status: notification.status,
        acknowledged_count: notification.acknowledged_count,
        fully_acknowledged: notification.fully_acknowledged_at.is_some(),
    }
}

/// Seconds between the send and the acknowledgment, never negative.
fn response_time(sent_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    sent_at.map(|sent| (now - sent).num_seconds().max(0))
}
