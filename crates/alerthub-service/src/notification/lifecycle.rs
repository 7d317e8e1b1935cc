//! Notification lifecycle manager.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::types::pagination::{PageRequest, PageResponse};
use alerthub_database::repositories::NotificationFilter;
use alerthub_delivery::{DeliveryDispatcher, DeliveryPriority, DispatchReport, OutboundMessage, Recipient};
use alerthub_entity::notification::{MedicalPayload, Notification, NotificationStatus, TargetType};

use super::detail::{AcknowledgmentProgress, NotificationDetail, SendOutcome};
use super::request::CreateNotification;
use super::targeting::resolve_recipients;
use crate::access::{authorize_detail, ensure_same_organization, hash_pin};
use crate::context::RequestContext;
use crate::deps::ServiceDeps;
use crate::escalation::EscalationEngine;
use crate::retry::retry_on_conflict;

/// Body that replaces a redacted message.
const REDACTED_MESSAGE: &str = "[redacted]";

/// Creates, sends, reads, resolves and expires notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    deps: ServiceDeps,
    dispatcher: Arc<DeliveryDispatcher>,
    engine: Arc<EscalationEngine>,
    default_expiry: Duration,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        deps: ServiceDeps,
        dispatcher: Arc<DeliveryDispatcher>,
        engine: Arc<EscalationEngine>,
        default_expiry_hours: i64,
    ) -> Self {
        Self {
            deps,
            dispatcher,
            engine,
            default_expiry: Duration::hours(default_expiry_hours.max(1)),
        }
    }

    /// Create a notification and send it unless it is scheduled for later.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateNotification,
    ) -> AppResult<SendOutcome> {
        let now = self.deps.clock.now();
        let expires_at = request.expires_at.unwrap_or(now + self.default_expiry);
        request.validate(now, expires_at)?;

        let recipients = resolve_recipients(self.deps.directory.as_ref(), ctx, &request).await?;
        if recipients.is_empty() {
            return Err(AppError::validation("The target resolved to no recipients"));
        }
        let total_recipients = i32::try_from(recipients.len())
            .map_err(|_| AppError::validation("Too many recipients"))?;
        if request.requires_acknowledgment && request.min_acknowledgments_required > total_recipients {
            return Err(AppError::validation(format!(
                "min_acknowledgments_required ({}) exceeds the number of recipients ({total_recipients})",
                request.min_acknowledgments_required
            )));
        }

        let access_pin_hash = match request.access_pin.as_deref() {
            Some(pin) => Some(hash_pin(pin)?),
            None => None,
        };
        let scheduled_for = request.scheduled_for.filter(|at| *at > now);
        let status = if scheduled_for.is_some() {
            NotificationStatus::Draft
        } else {
            NotificationStatus::Pending
        };
        let team_id = match request.target_type {
            TargetType::Team => request.team_id.or(request.target_id),
            _ => request.team_id,
        };

        let notification = Notification {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            team_id,
            created_by: ctx.user_id,
            urgency_level: request.urgency_level,
            medical_type: request.medical_type,
            title: request.title.trim().to_string(),
            message: request.message,
            payload: request.payload,
            target_type: request.target_type,
            target_id: request.target_id,
            recipient_ids: recipients,
            delivery_channels: request.delivery_channels,
            channel_config: request.channel_config,
            delivery_results: Vec::new(),
            requires_acknowledgment: request.requires_acknowledgment,
            acknowledgment_timeout_minutes: request.acknowledgment_timeout_minutes,
            required_acknowledgers: request.required_acknowledgers,
            min_acknowledgments_required: request.min_acknowledgments_required,
            enable_escalation: request.enable_escalation,
            escalation_policy: request.escalation_policy,
            attachments: request.attachments,
            privacy: request.privacy,
            access_pin_hash,
            status,
            scheduled_for,
            sent_at: None,
            first_acknowledged_at: None,
            fully_acknowledged_at: None,
            escalated_at: None,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            expires_at,
            redacted_at: None,
            total_recipients,
            acknowledged_count: 0,
            escalation_level: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let notification = self.deps.stores.notifications.insert(&notification).await?;
        info!(
            notification_id = %notification.id,
            organization_id = %notification.organization_id,
            urgency = %notification.urgency_level,
            medical_type = %notification.medical_type,
            recipients = notification.total_recipients,
            status = %notification.status,
            "Notification created"
        );

        if notification.status == NotificationStatus::Draft {
            return Ok(SendOutcome {
                notification,
                delivery: Vec::new(),
                partial_failure: false,
            });
        }
        self.send(notification.id).await
    }

    /// Dispatch a pending notification to its recipients on every channel.
    ///
    /// Dispatch runs outside the notification's lock; the result is
    /// recorded afterwards and the level-1 timer armed.
    pub async fn send(&self, id: Uuid) -> AppResult<SendOutcome> {
        let snapshot = self.deps.load(id).await?;
        if snapshot.status == NotificationStatus::Draft {
            return Err(AppError::validation(format!(
                "Notification {id} is scheduled and cannot be sent yet"
            )));
        }
        if snapshot.is_final() {
            warn!(notification_id = %id, status = %snapshot.status, "Skipping send of a final notification");
            return Ok(SendOutcome {
                notification: snapshot,
                delivery: Vec::new(),
                partial_failure: false,
            });
        }

        let message = OutboundMessage {
            notification_id: snapshot.id,
            title: snapshot.title.clone(),
            message: snapshot.message.clone(),
            priority: DeliveryPriority::for_urgency(snapshot.urgency_level),
            expires_at: snapshot.expires_at,
            escalation_level: 0,
        };
        let recipients: Vec<Recipient> = snapshot
            .recipient_ids
            .iter()
            .copied()
            .map(Recipient::from)
            .collect();

        let report = self
            .dispatcher
            .dispatch(&snapshot.delivery_channels, &recipients, &message)
            .await;

        let report_ref = &report;
        let notification = retry_on_conflict(self.deps.conflict_retries, move || {
            self.record_send(id, report_ref)
        })
        .await?;

        Ok(SendOutcome {
            notification,
            partial_failure: report.partial_failure(),
            delivery: report.results,
        })
    }

    async fn record_send(&self, id: Uuid, report: &DispatchReport) -> AppResult<Notification> {
        let _guard = self.deps.locks.lock(id).await;
        let notification = self.deps.load(id).await?;
        let mut notification = self.deps.expire_if_due(notification).await?;
        if notification.is_final() {
            return Ok(notification);
        }

        let now = self.deps.clock.now();
        if notification.status == NotificationStatus::Pending {
            notification.status = NotificationStatus::Delivered;
        }
        notification.sent_at = Some(now);
        notification.delivery_results = report.results.clone();
        notification.updated_at = now;
        let notification = self.deps.stores.notifications.update(&notification).await?;

        self.engine.arm_first(&notification).await?;

        if report.all_failed() {
            warn!(notification_id = %id, "Every delivery channel failed");
        }
        info!(
            notification_id = %id,
            status = %notification.status,
            channels = report.results.len(),
            partial_failure = report.partial_failure(),
            "Notification sent"
        );
        Ok(notification)
    }

    /// Close a notification.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        notes: Option<String>,
    ) -> AppResult<Notification> {
        let notes = notes.as_deref();
        retry_on_conflict(self.deps.conflict_retries, move || {
            self.resolve_locked(ctx, id, notes)
        })
        .await
    }

    async fn resolve_locked(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<Notification> {
        let _guard = self.deps.locks.lock(id).await;
        let notification = self.deps.load(id).await?;
        ensure_same_organization(&notification, ctx)?;
        let mut notification = self.deps.expire_if_due(notification).await?;
        if notification.is_final() {
            return Err(AppError::already_final(format!(
                "Notification {id} is already {}",
                notification.status
            )));
        }

        let now = self.deps.clock.now();
        let previous = notification.status;
        notification.status = NotificationStatus::Resolved;
        notification.resolved_at = Some(now);
        notification.resolved_by = Some(ctx.user_id);
        notification.resolution_notes = notes.map(str::to_string);
        notification.updated_at = now;
        let notification = self.deps.stores.notifications.update(&notification).await?;
        let cancelled = self.deps.stores.tasks.cancel_outstanding(id, now).await?;

        info!(
            notification_id = %id,
            resolved_by = %ctx.user_id,
            from = %previous,
            cancelled_tasks = cancelled,
            "Notification resolved"
        );
        Ok(notification)
    }

    /// Full detail of a notification, gated by organization and privacy.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        pin: Option<&str>,
    ) -> AppResult<NotificationDetail> {
        let notification = self.deps.load(id).await?;
        authorize_detail(&notification, ctx, pin)?;
        let notification = self.refresh_expiry(notification).await?;

        let (acknowledgments, acknowledged_by) = self.deps.acknowledgments(id).await?;
        let mut escalations = self
            .deps
            .stores
            .escalations
            .list_by_notification(id)
            .await?;
        escalations.sort_by_key(|e| e.level);

        Ok(NotificationDetail {
            progress: AcknowledgmentProgress::compute(&notification, &acknowledged_by),
            notification,
            acknowledgments,
            escalations,
        })
    }

    /// Non-final notifications of the actor's organization.
    pub async fn list_active(
        &self,
        ctx: &RequestContext,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let listed = self
            .deps
            .stores
            .notifications
            .list_active(ctx.organization_id, filter, page)
            .await?;

        let now = self.deps.clock.now();
        let mut items = Vec::with_capacity(listed.items.len());
        let mut expired = 0u64;
        for notification in listed.items {
            if notification.is_past_expiry(now) {
                self.refresh_expiry(notification).await?;
                expired += 1;
            } else {
                items.push(notification);
            }
        }

        Ok(PageResponse::new(
            items,
            listed.page,
            listed.page_size,
            listed.total_items.saturating_sub(expired),
        ))
    }

    /// Send every draft whose scheduled time has passed. Returns how many
    /// were sent.
    pub async fn send_due_scheduled(&self, limit: u32) -> AppResult<usize> {
        let now = self.deps.clock.now();
        let drafts = self
            .deps
            .stores
            .notifications
            .find_due_drafts(now, limit)
            .await?;

        let mut sent = 0;
        for draft in drafts {
            let id = draft.id;
            match retry_on_conflict(self.deps.conflict_retries, move || self.release_draft(id)).await {
                Ok(true) => match self.send(id).await {
                    Ok(_) => sent += 1,
                    Err(e) => error!(notification_id = %id, error = %e, "Scheduled send failed"),
                },
                Ok(false) => {}
                Err(e) => error!(notification_id = %id, error = %e, "Failed to release scheduled notification"),
            }
        }
        Ok(sent)
    }

    /// Move a due draft to pending. Returns whether it should be sent now.
    async fn release_draft(&self, id: Uuid) -> AppResult<bool> {
        let _guard = self.deps.locks.lock(id).await;
        let notification = self.deps.load(id).await?;
        let mut notification = self.deps.expire_if_due(notification).await?;
        let now = self.deps.clock.now();
        if notification.status != NotificationStatus::Draft
            || notification.scheduled_for.is_some_and(|at| at > now)
        {
            return Ok(false);
        }
        notification.status = NotificationStatus::Pending;
        notification.updated_at = now;
        self.deps.stores.notifications.update(&notification).await?;
        info!(notification_id = %id, "Scheduled notification released");
        Ok(true)
    }

    /// Expire notifications nobody has read since their expiry passed.
    pub async fn expire_overdue(&self, limit: u32) -> AppResult<usize> {
        let now = self.deps.clock.now();
        let overdue = self
            .deps
            .stores
            .notifications
            .find_expirable(now, limit)
            .await?;

        let mut expired = 0;
        for notification in overdue {
            let id = notification.id;
            match self.refresh_expiry(notification).await {
                Ok(n) if n.status == NotificationStatus::Expired => expired += 1,
                Ok(_) => {}
                Err(e) => error!(notification_id = %id, error = %e, "Failed to expire notification"),
            }
        }
        Ok(expired)
    }

    /// Strip the medical content of final notifications whose auto-delete
    /// period has passed. The record itself is kept.
    pub async fn redact_due(&self, limit: u32) -> AppResult<usize> {
        let now = self.deps.clock.now();
        let candidates = self
            .deps
            .stores
            .notifications
            .find_redaction_candidates(limit)
            .await?;

        let mut redacted = 0;
        for candidate in candidates {
            if candidate.redaction_due_at().is_none_or(|at| at > now) {
                continue;
            }
            let id = candidate.id;
            match retry_on_conflict(self.deps.conflict_retries, move || self.redact(id)).await {
                Ok(true) => redacted += 1,
                Ok(false) => {}
                Err(e) => error!(notification_id = %id, error = %e, "Failed to redact notification"),
            }
        }
        Ok(redacted)
    }

    async fn redact(&self, id: Uuid) -> AppResult<bool> {
        let _guard = self.deps.locks.lock(id).await;
        let mut notification = self.deps.load(id).await?;
        let now = self.deps.clock.now();
        if notification.is_redacted() || notification.redaction_due_at().is_none_or(|at| at > now) {
            return Ok(false);
        }

        notification.payload = MedicalPayload::default();
        notification.message = REDACTED_MESSAGE.to_string();
        notification.attachments.clear();
        notification.redacted_at = Some(now);
        notification.updated_at = now;
        self.deps.stores.notifications.update(&notification).await?;
        info!(notification_id = %id, "Notification content redacted");
        Ok(true)
    }

    /// Expire a notification observed past its expiry, under its lock.
    async fn refresh_expiry(&self, notification: Notification) -> AppResult<Notification> {
        if !notification.is_past_expiry(self.deps.clock.now()) {
            return Ok(notification);
        }
        let id = notification.id;
        retry_on_conflict(self.deps.conflict_retries, move || async move {
            let _guard = self.deps.locks.lock(id).await;
            let current = self.deps.load(id).await?;
            self.deps.expire_if_due(current).await
        })
        .await
    }
}
