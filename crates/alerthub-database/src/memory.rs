//! In-memory store using a Tokio mutex for single-node deployments and tests.
//!
//! Implements every repository trait with the same uniqueness and
//! optimistic-version semantics as the PostgreSQL schema.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::types::pagination::{PageRequest, PageResponse};
use alerthub_entity::acknowledgment::Acknowledgment;
use alerthub_entity::escalation::{Escalation, EscalationStatus, EscalationTask, TaskStatus};
use alerthub_entity::notification::{Notification, NotificationStatus};

use crate::repositories::{
    AcknowledgmentStore, EscalationStore, EscalationTaskStore, NotificationFilter,
    NotificationStore,
};

#[derive(Debug, Default)]
struct InnerState {
    notifications: HashMap<Uuid, Notification>,
    acknowledgments: Vec<Acknowledgment>,
    escalations: Vec<Escalation>,
    tasks: HashMap<Uuid, EscalationTask>,
}

/// Process-local store. State is lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every task ever created for a notification, oldest first.
    pub async fn tasks_for(&self, notification_id: Uuid) -> Vec<EscalationTask> {
        let state = self.state.lock().await;
        let mut tasks: Vec<_> = state
            .tasks
            .values()
            .filter(|t| t.notification_id == notification_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.target_level));
        tasks
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        let mut state = self.state.lock().await;
        if state.notifications.contains_key(&notification.id) {
            return Err(AppError::conflict(format!(
                "Notification {} already exists",
                notification.id
            )));
        }
        state
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self.state.lock().await.notifications.get(&id).cloned())
    }

    async fn update(&self, notification: &Notification) -> AppResult<Notification> {
        let mut state = self.state.lock().await;
        let stored = state
            .notifications
            .get_mut(&notification.id)
            .ok_or_else(|| AppError::not_found(format!("Notification {} not found", notification.id)))?;
        if stored.version != notification.version {
            return Err(AppError::conflict(format!(
                "Notification {} was modified concurrently (expected version {}, found {})",
                notification.id, notification.version, stored.version
            )));
        }
        let mut next = notification.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn list_active(
        &self,
        organization_id: Uuid,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state.lock().await;
        let mut matching: Vec<_> = state
            .notifications
            .values()
            .filter(|n| n.organization_id == organization_id && n.status.is_active())
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn find_created_between(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .notifications
            .values()
            .filter(|n| {
                n.organization_id == organization_id && n.created_at >= start && n.created_at < end
            })
            .cloned()
            .collect();
        found.sort_by_key(|n| n.created_at);
        Ok(found)
    }

    async fn find_due_drafts(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .notifications
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Draft && n.scheduled_for.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        found.sort_by_key(|n| n.scheduled_for);
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn find_expirable(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .notifications
            .values()
            .filter(|n| n.is_past_expiry(now))
            .cloned()
            .collect();
        found.sort_by_key(|n| n.expires_at);
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn find_redaction_candidates(&self, limit: u32) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .notifications
            .values()
            .filter(|n| {
                n.is_final() && !n.is_redacted() && n.privacy.auto_delete_after_hours.is_some()
            })
            .cloned()
            .collect();
        found.sort_by_key(|n| n.updated_at);
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl AcknowledgmentStore for MemoryStore {
    async fn insert(&self, ack: &Acknowledgment) -> AppResult<Acknowledgment> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .acknowledgments
            .iter()
            .any(|a| a.notification_id == ack.notification_id && a.user_id == ack.user_id);
        if duplicate {
            return Err(AppError::conflict(format!(
                "User {} already acknowledged notification {}",
                ack.user_id, ack.notification_id
            )));
        }
        state.acknowledgments.push(ack.clone());
        Ok(ack.clone())
    }

    async fn find_by_user(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Acknowledgment>> {
        let state = self.state.lock().await;
        Ok(state
            .acknowledgments
            .iter()
            .find(|a| a.notification_id == notification_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Acknowledgment>> {
        let state = self.state.lock().await;
        Ok(state
            .acknowledgments
            .iter()
            .filter(|a| a.notification_id == notification_id)
            .cloned()
            .collect())
    }

    async fn list_by_notifications(
        &self,
        notification_ids: &[Uuid],
    ) -> AppResult<Vec<Acknowledgment>> {
        let state = self.state.lock().await;
        Ok(state
            .acknowledgments
            .iter()
            .filter(|a| notification_ids.contains(&a.notification_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EscalationStore for MemoryStore {
    async fn insert(&self, escalation: &Escalation) -> AppResult<Escalation> {
        let mut state = self.state.lock().await;
        let duplicate = state.escalations.iter().any(|e| {
            e.notification_id == escalation.notification_id && e.level == escalation.level
        });
        if duplicate {
            return Err(AppError::conflict(format!(
                "Notification {} already escalated to level {}",
                escalation.notification_id, escalation.level
            )));
        }
        state.escalations.push(escalation.clone());
        Ok(escalation.clone())
    }

    async fn finish(&self, escalation: &Escalation) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .escalations
            .iter_mut()
            .find(|e| e.id == escalation.id)
            .ok_or_else(|| AppError::not_found(format!("Escalation {} not found", escalation.id)))?;
        stored.status = escalation.status;
        stored.delivery_results = escalation.delivery_results.clone();
        stored.completed_at = escalation.completed_at;
        Ok(())
    }

    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Escalation>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .escalations
            .iter()
            .filter(|e| e.notification_id == notification_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.level);
        Ok(found)
    }

    async fn list_by_notifications(&self, notification_ids: &[Uuid]) -> AppResult<Vec<Escalation>> {
        let state = self.state.lock().await;
        Ok(state
            .escalations
            .iter()
            .filter(|e| notification_ids.contains(&e.notification_id))
            .cloned()
            .collect())
    }

    async fn claim_interrupted(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Escalation>> {
        let mut state = self.state.lock().await;
        let mut stale: Vec<_> = state
            .escalations
            .iter_mut()
            .filter(|e| {
                e.status == EscalationStatus::InProgress
                    && e.dispatch_claimed_at.is_none_or(|at| at < lease_cutoff)
            })
            .collect();
        stale.sort_by_key(|e| e.created_at);
        Ok(stale
            .into_iter()
            .take(limit as usize)
            .map(|e| {
                e.dispatch_claimed_at = Some(now);
                e.clone()
            })
            .collect())
    }
}

#[async_trait]
impl EscalationTaskStore for MemoryStore {
    async fn insert(&self, task: &EscalationTask) -> AppResult<EscalationTask> {
        let mut state = self.state.lock().await;
        let outstanding = state
            .tasks
            .values()
            .any(|t| t.notification_id == task.notification_id && t.status.is_outstanding());
        if outstanding {
            return Err(AppError::conflict(format!(
                "Notification {} already has an outstanding escalation task",
                task.notification_id
            )));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn find_outstanding(&self, notification_id: Uuid) -> AppResult<Option<EscalationTask>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .values()
            .find(|t| t.notification_id == notification_id && t.status.is_outstanding())
            .cloned())
    }

    async fn cancel_outstanding(&self, notification_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut cancelled = 0;
        for task in state.tasks.values_mut() {
            if task.notification_id == notification_id && task.status.is_outstanding() {
                task.status = TaskStatus::Cancelled;
                task.updated_at = now;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<EscalationTask>> {
        let mut state = self.state.lock().await;
        let mut due: Vec<_> = state
            .tasks
            .values()
            .filter(|t| match t.status {
                TaskStatus::Pending => t.due_at <= now,
                TaskStatus::Running => t.claimed_at.is_some_and(|at| at < lease_cutoff),
                _ => false,
            })
            .map(|t| (t.due_at, t.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(task) = state.tasks.get_mut(&id) {
                task.status = TaskStatus::Running;
                task.claimed_at = Some(now);
                task.updated_at = now;
                claimed.push(task.clone());
            }
        }
        Ok(claimed)
    }

    async fn rearm(
        &self,
        notification_id: Uuid,
        fired: Option<Uuid>,
        next: Option<&EscalationTask>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for task in state.tasks.values_mut() {
            if task.notification_id == notification_id && task.status.is_outstanding() {
                task.status = if Some(task.id) == fired {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Cancelled
                };
                task.updated_at = now;
            }
        }
        if let Some(task) = next {
            state.tasks.insert(task.id, task.clone());
        }
        Ok(())
    }

    async fn complete(&self, task_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(task) = state.tasks.get_mut(&task_id)
            && task.status == TaskStatus::Running
        {
            task.status = TaskStatus::Completed;
            task.updated_at = now;
        }
        Ok(())
    }

    async fn reschedule(
        &self,
        task_id: Uuid,
        due_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(task) = state.tasks.get_mut(&task_id)
            && task.status == TaskStatus::Running
        {
            task.status = TaskStatus::Pending;
            task.due_at = due_at;
            task.last_error = Some(error.to_string());
            task.attempts += 1;
            task.claimed_at = None;
            task.updated_at = now;
        }
        Ok(())
    }
}
