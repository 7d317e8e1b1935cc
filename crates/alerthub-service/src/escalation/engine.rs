//! Escalation engine.
//!
//! Each notification with escalation enabled has at most one outstanding
//! [`EscalationTask`]. When a task fires the engine re-reads the
//! notification under its lock, decides whether the escalation still
//! applies, writes the escalation record and the new level, re-arms the
//! next level and only then dispatches, outside the lock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use alerthub_core::config::escalation::EscalationConfig;
use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_delivery::{DeliveryDispatcher, DeliveryPriority, OutboundMessage, Recipient};
use alerthub_entity::escalation::{
    Escalation, EscalationReason, EscalationStatus, EscalationTask,
};
use alerthub_entity::notification::{DeliveryChannel, Notification, NotificationStatus};

use super::message::{escalation_title, template};
use super::targets::{LevelTargets, TargetPlan};
use crate::access::ensure_same_organization;
use crate::context::RequestContext;
use crate::deps::ServiceDeps;
use crate::retry::retry_on_conflict;

/// Request to escalate a notification outside its timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEscalation {
    /// Reason recorded on the escalation.
    #[serde(default = "default_reason")]
    pub reason: EscalationReason,
    /// Users to notify instead of the level policy's targets.
    #[serde(default)]
    pub target_users: Vec<Uuid>,
    /// Roles to notify instead of the level policy's targets.
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
    pub message: Option<String>,
}

fn default_reason() -> EscalationReason {
    EscalationReason::Manual
}

impl Default for ManualEscalation {
    fn default() -> Self {
        Self {
            reason: EscalationReason::Manual,
            target_users: Vec::new(),
            target_roles: Vec::new(),
            use_emergency_contacts: false,
            channels: None,
            message: None,
        }
    }
}

impl ManualEscalation {
    fn explicit_plan(&self) -> TargetPlan {
        TargetPlan {
            users: self.target_users.clone(),
            roles: self.target_roles.clone(),
            use_emergency_contacts: self.use_emergency_contacts,
            channels: self.channels.clone(),
            message: self.message.clone(),
        }
    }
}

/// A finished escalation.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationOutcome {
    /// The escalation record after dispatch.
    pub escalation: Escalation,
    /// Whether any channel failed.
    pub partial_failure: bool,
}

/// What a timer fire did.
#[derive(Debug, Clone)]
pub enum FireOutcome {
    /// The notification was escalated.
    Escalated(Box<EscalationOutcome>),
    /// Nothing to do; the reason is logged.
    Skipped(String),
}

/// Escalation written under the lock, waiting to be dispatched.
#[derive(Debug)]
struct Prepared {
    escalation: Escalation,
    recipients: Vec<Recipient>,
    message: OutboundMessage,
}

#[derive(Debug)]
enum Decision {
    Skip(String),
    Escalate(Box<Prepared>),
}

/// Owns escalation timers and escalation fan-out.
#[derive(Debug, Clone)]
pub struct EscalationEngine {
    deps: ServiceDeps,
    dispatcher: Arc<DeliveryDispatcher>,
    config: EscalationConfig,
}

impl EscalationEngine {
    /// Creates a new escalation engine.
    pub fn new(deps: ServiceDeps, dispatcher: Arc<DeliveryDispatcher>, config: EscalationConfig) -> Self {
        Self {
            deps,
            dispatcher,
            config,
        }
    }

    /// Arm the level-1 timer of a freshly sent notification.
    ///
    /// Must be called while holding the notification's lock.
    pub async fn arm_first(&self, notification: &Notification) -> AppResult<Option<EscalationTask>> {
        if notification.status != NotificationStatus::Delivered {
            return Ok(None);
        }
        let (Some(delay), Some(sent_at)) = (notification.delay_before_level(1), notification.sent_at)
        else {
            return Ok(None);
        };

        let now = self.deps.clock.now();
        let task = EscalationTask::new(notification.id, 1, sent_at + delay, now);
        self.deps
            .stores
            .tasks
            .rearm(notification.id, None, Some(&task), now)
            .await?;

        info!(
            notification_id = %notification.id,
            due_at = %task.due_at,
            "Escalation level 1 armed"
        );
        Ok(Some(task))
    }

    /// Execute a due escalation task.
    pub async fn fire(&self, task: &EscalationTask) -> AppResult<FireOutcome> {
        let decision =
            retry_on_conflict(self.deps.conflict_retries, move || self.fire_locked(task)).await?;

        match decision {
            Decision::Skip(reason) => {
                debug!(
                    task_id = %task.id,
                    notification_id = %task.notification_id,
                    target_level = task.target_level,
                    reason = %reason,
                    "Escalation task skipped"
                );
                Ok(FireOutcome::Skipped(reason))
            }
            Decision::Escalate(prepared) => {
                let outcome = self.dispatch(*prepared).await;
                Ok(FireOutcome::Escalated(Box::new(outcome)))
            }
        }
    }

    /// Escalate a notification on request.
    ///
    /// Returns `None` when a non-manual reason is given and no further
    /// policy level exists.
    pub async fn escalate(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
        request: &ManualEscalation,
    ) -> AppResult<Option<EscalationOutcome>> {
        let prepared = retry_on_conflict(self.deps.conflict_retries, move || {
            self.escalate_locked(ctx, notification_id, request)
        })
        .await?;

        match prepared {
            Some(prepared) => Ok(Some(self.dispatch(*prepared).await)),
            None => {
                info!(
                    notification_id = %notification_id,
                    reason = %request.reason,
                    "No further escalation level; nothing to do"
                );
                Ok(None)
            }
        }
    }

    /// Put a task whose fire failed back to pending with exponential backoff.
    pub async fn defer(&self, task: &EscalationTask, failure: &AppError) -> AppResult<()> {
        let now = self.deps.clock.now();
        let delay = backoff(
            task.attempts,
            self.config.retry_base_seconds,
            self.config.retry_max_seconds,
        );
        let due_at = now + delay;
        warn!(
            task_id = %task.id,
            notification_id = %task.notification_id,
            attempts = task.attempts + 1,
            due_at = %due_at,
            error = %failure,
            "Escalation task failed; retrying later"
        );
        self.deps
            .stores
            .tasks
            .reschedule(task.id, due_at, &failure.to_string(), now)
            .await
    }

    /// Claim escalations whose dispatch was interrupted, e.g. by a crash
    /// between recording the level and finishing delivery.
    pub async fn claim_interrupted(&self, limit: u32) -> AppResult<Vec<Escalation>> {
        let now = self.deps.clock.now();
        let lease_cutoff = now - Duration::seconds(self.config.task_lease_seconds);
        self.deps
            .stores
            .escalations
            .claim_interrupted(now, lease_cutoff, limit)
            .await
    }

    /// Deliver an interrupted escalation again to its recorded audience.
    ///
    /// An escalation whose notification has since closed or been fully
    /// acknowledged is cancelled instead; `None` is returned then.
    pub async fn redeliver(&self, escalation: Escalation) -> AppResult<Option<EscalationOutcome>> {
        let escalation_id = escalation.id;
        let notification_id = escalation.notification_id;
        let prepared = retry_on_conflict(self.deps.conflict_retries, || {
            self.redeliver_locked(escalation.clone())
        })
        .await?;

        match prepared {
            Some(prepared) => {
                info!(
                    escalation_id = %escalation_id,
                    notification_id = %notification_id,
                    "Redelivering interrupted escalation"
                );
                Ok(Some(self.dispatch(prepared).await))
            }
            None => Ok(None),
        }
    }

    async fn redeliver_locked(&self, mut escalation: Escalation) -> AppResult<Option<Prepared>> {
        let _guard = self.deps.locks.lock(escalation.notification_id).await;
        let now = self.deps.clock.now();

        let notification = match self
            .deps
            .stores
            .notifications
            .find_by_id(escalation.notification_id)
            .await?
        {
            Some(notification) => Some(self.deps.expire_if_due(notification).await?),
            None => None,
        };
        let open = match &notification {
            Some(n) if !n.is_final() && n.status != NotificationStatus::Acknowledged => {
                let (_, acknowledged_by) = self.deps.acknowledgments(n.id).await?;
                !n.is_fully_acknowledged(&acknowledged_by)
            }
            _ => false,
        };
        let Some(notification) = notification.filter(|_| open) else {
            escalation.status = EscalationStatus::Cancelled;
            escalation.completed_at = Some(now);
            self.deps.stores.escalations.finish(&escalation).await?;
            info!(
                escalation_id = %escalation.id,
                notification_id = %escalation.notification_id,
                "Interrupted escalation no longer needed; cancelled"
            );
            return Ok(None);
        };

        let recipients = LevelTargets::from(&escalation).recipients();
        let message = outbound(&notification, escalation.level, escalation.message.clone());
        Ok(Some(Prepared {
            escalation,
            recipients,
            message,
        }))
    }

    async fn fire_locked(&self, task: &EscalationTask) -> AppResult<Decision> {
        let _guard = self.deps.locks.lock(task.notification_id).await;
        let now = self.deps.clock.now();
        let tasks = &self.deps.stores.tasks;

        let Some(notification) = self
            .deps
            .stores
            .notifications
            .find_by_id(task.notification_id)
            .await?
        else {
            tasks.complete(task.id, now).await?;
            return Ok(Decision::Skip("notification no longer exists".into()));
        };
        let notification = self.deps.expire_if_due(notification).await?;

        let outstanding = tasks.find_outstanding(notification.id).await?;
        if outstanding.map(|t| t.id) != Some(task.id) {
            return Ok(Decision::Skip("task is no longer outstanding".into()));
        }

        if notification.is_final() {
            tasks.complete(task.id, now).await?;
            return Ok(Decision::Skip(format!("notification is {}", notification.status)));
        }

        let (_, acknowledged_by) = self.deps.acknowledgments(notification.id).await?;
        if notification.status == NotificationStatus::Acknowledged
            || notification.is_fully_acknowledged(&acknowledged_by)
        {
            tasks.complete(task.id, now).await?;
            return Ok(Decision::Skip("notification is fully acknowledged".into()));
        }

        if notification.escalation_level >= task.target_level {
            // An earlier attempt applied the level but did not re-arm.
            let from = notification.escalated_at.unwrap_or(now);
            let next = self.next_task(&notification, from, now);
            tasks
                .rearm(notification.id, Some(task.id), next.as_ref(), now)
                .await?;
            return Ok(Decision::Skip(format!(
                "level {} already reached",
                task.target_level
            )));
        }

        let level = notification.escalation_level + 1;
        if level != task.target_level {
            warn!(
                notification_id = %notification.id,
                task_level = task.target_level,
                level,
                "Task level does not follow the current level; escalating to the next level"
            );
        }

        let Some(policy) = notification.level_policy(level).cloned() else {
            tasks.complete(task.id, now).await?;
            return Ok(Decision::Skip(format!("no escalation policy for level {level}")));
        };

        let acknowledged = acknowledged_by.len();
        let reason = EscalationReason::for_timer(
            notification.requires_acknowledgment,
            i32::try_from(acknowledged).unwrap_or(i32::MAX),
        );
        let prepared = self
            .prepare(
                notification,
                level,
                reason,
                &TargetPlan::from(&policy),
                acknowledged,
                None,
                Some(task.id),
            )
            .await?;
        Ok(Decision::Escalate(Box::new(prepared)))
    }

    async fn escalate_locked(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
        request: &ManualEscalation,
    ) -> AppResult<Option<Box<Prepared>>> {
        let _guard = self.deps.locks.lock(notification_id).await;

        let notification = self.deps.load(notification_id).await?;
        ensure_same_organization(&notification, ctx)?;
        let notification = self.deps.expire_if_due(notification).await?;

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

        let level = notification.escalation_level + 1;
        let policy = notification.level_policy(level).cloned();
        if request.reason != EscalationReason::Manual && policy.is_none() {
            return Ok(None);
        }

        let (_, acknowledged_by) = self.deps.acknowledgments(notification.id).await?;
        let explicit = request.explicit_plan();
        let plan = if !explicit.is_empty() {
            explicit
        } else if let Some(policy) = &policy {
            TargetPlan {
                channels: explicit.channels.or_else(|| policy.channels.clone()),
                message: explicit.message.or_else(|| policy.message.clone()),
                ..TargetPlan::from(policy)
            }
        } else {
            // Beyond the policy: remind everyone who has not acknowledged.
            TargetPlan {
                users: notification
                    .recipient_ids
                    .iter()
                    .filter(|id| !acknowledged_by.contains(id))
                    .copied()
                    .collect(),
                ..explicit
            }
        };

        let prepared = self
            .prepare(
                notification,
                level,
                request.reason,
                &plan,
                acknowledged_by.len(),
                Some(ctx.user_id),
                None,
            )
            .await?;
        Ok(Some(Box::new(prepared)))
    }

    /// Write the escalation record and the new level, and re-arm the timer.
    #[allow(clippy::too_many_arguments)]
    async fn prepare(
        &self,
        mut notification: Notification,
        level: i32,
        reason: EscalationReason,
        plan: &TargetPlan,
        acknowledged: usize,
        triggered_by: Option<Uuid>,
        fired_task: Option<Uuid>,
    ) -> AppResult<Prepared> {
        let now = self.deps.clock.now();
        let stores = &self.deps.stores;

        let targets = LevelTargets::resolve(self.deps.directory.as_ref(), &notification, plan).await?;
        if targets.is_empty() {
            warn!(
                notification_id = %notification.id,
                level,
                "Escalation targets resolved to nobody"
            );
        }
        let channels = plan
            .channels
            .clone()
            .unwrap_or_else(|| notification.delivery_channels.clone());
        let text = plan
            .message
            .clone()
            .unwrap_or_else(|| template(reason, &notification, level, acknowledged));

        // A retry after a failed notification write finds its own record.
        let existing = stores
            .escalations
            .list_by_notification(notification.id)
            .await?
            .into_iter()
            .find(|e| e.level == level);
        let escalation = match existing {
            Some(escalation) => escalation,
            None => {
                stores
                    .escalations
                    .insert(&Escalation {
                        id: Uuid::new_v4(),
                        notification_id: notification.id,
                        level,
                        reason,
                        target_user_ids: targets.users.clone(),
                        target_roles: targets.roles.clone(),
                        emergency_contacts: targets.contacts.clone(),
                        channels: channels.clone(),
                        message: text.clone(),
                        delivery_results: Vec::new(),
                        triggered_by,
                        status: EscalationStatus::InProgress,
                        created_at: now,
                        completed_at: None,
                        dispatch_claimed_at: Some(now),
                    })
                    .await?
            }
        };

        notification.escalation_level = level;
        if notification.status != NotificationStatus::Acknowledged {
            notification.status = NotificationStatus::Escalated;
        }
        notification.escalated_at = Some(now);
        let added = notification.add_recipients(&targets.users);
        notification.updated_at = now;
        let notification = stores.notifications.update(&notification).await?;

        let next = if notification.status == NotificationStatus::Acknowledged {
            None
        } else {
            self.next_task(&notification, now, now)
        };
        stores
            .tasks
            .rearm(notification.id, fired_task, next.as_ref(), now)
            .await?;

        info!(
            notification_id = %notification.id,
            level,
            reason = %reason,
            users = targets.users.len(),
            contacts = targets.contacts.len(),
            new_recipients = added,
            next_level_due = ?next.as_ref().map(|t| t.due_at),
            "Notification escalated"
        );

        Ok(Prepared {
            message: outbound(&notification, level, text),
            escalation,
            recipients: targets.recipients(),
        })
    }

    /// Send a prepared escalation and record its results.
    async fn dispatch(&self, prepared: Prepared) -> EscalationOutcome {
        let Prepared {
            mut escalation,
            recipients,
            message,
        } = prepared;

        let report = self
            .dispatcher
            .dispatch(&escalation.channels, &recipients, &message)
            .await;

        escalation.status = if report.all_failed() {
            EscalationStatus::Failed
        } else {
            EscalationStatus::Completed
        };
        escalation.delivery_results = report.results.clone();
        escalation.completed_at = Some(self.deps.clock.now());

        if let Err(e) = self.deps.stores.escalations.finish(&escalation).await {
            error!(
                escalation_id = %escalation.id,
                notification_id = %escalation.notification_id,
                error = %e,
                "Failed to record escalation delivery results"
            );
        }

        info!(
            escalation_id = %escalation.id,
            notification_id = %escalation.notification_id,
            level = escalation.level,
            status = %escalation.status,
            partial_failure = report.partial_failure(),
            "Escalation dispatched"
        );

        EscalationOutcome {
            partial_failure: report.partial_failure(),
            escalation,
        }
    }

    /// Task for the level after the notification's current one, if policy
    /// defines it.
    fn next_task(
        &self,
        notification: &Notification,
        from: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<EscalationTask> {
        let level = notification.escalation_level + 1;
        let delay = notification.delay_before_level(level)?;
        Some(EscalationTask::new(notification.id, level, from + delay, now))
    }
}

fn outbound(notification: &Notification, level: i32, text: String) -> OutboundMessage {
    OutboundMessage {
        notification_id: notification.id,
        title: escalation_title(notification, level),
        message: text,
        priority: DeliveryPriority::for_urgency(notification.urgency_level).raised(),
        expires_at: notification.expires_at,
        escalation_level: level,
    }
}

/// Exponential backoff: `base * 2^attempts`, capped at `max`.
fn backoff(attempts: i32, base_seconds: i64, max_seconds: i64) -> Duration {
    let exponent = u32::try_from(attempts.clamp(0, 20)).unwrap_or(20);
    let seconds = base_seconds
        .max(1)
        .saturating_mul(2_i64.saturating_pow(exponent))
        .min(max_seconds.max(1));
    Duration::seconds(seconds)
}
