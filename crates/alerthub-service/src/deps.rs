//! Collaborators shared by every service.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::traits::directory::Directory;
use alerthub_database::Stores;
use alerthub_entity::acknowledgment::Acknowledgment;
use alerthub_entity::notification::{Notification, NotificationStatus};

use crate::locks::NotificationLocks;

/// Stores, directory, clock and locks handed to each service.
#[derive(Debug, Clone)]
pub struct ServiceDeps {
    /// Persistence.
    pub stores: Stores,
    /// User and team directory.
    pub directory: Arc<dyn Directory>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Per-notification mutexes.
    pub locks: Arc<NotificationLocks>,
    /// Extra attempts after an optimistic version conflict.
    pub conflict_retries: u32,
}

impl ServiceDeps {
    /// Bundle the collaborators.
    pub fn new(
        stores: Stores,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        conflict_retries: u32,
    ) -> Self {
        Self {
            stores,
            directory,
            clock,
            locks: Arc::new(NotificationLocks::new()),
            conflict_retries,
        }
    }

    /// Load a notification or fail with `NotFound`.
    pub async fn load(&self, id: Uuid) -> AppResult<Notification> {
        self.stores
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Acknowledgments of a notification and the set of users behind them.
    pub async fn acknowledgments(
        &self,
        notification_id: Uuid,
    ) -> AppResult<(Vec<Acknowledgment>, HashSet<Uuid>)> {
        let acks = self
            .stores
            .acknowledgments
            .list_by_notification(notification_id)
            .await?;
        let users = acks.iter().map(|a| a.user_id).collect();
        Ok((acks, users))
    }

    /// Expire the notification if its expiry has passed.
    ///
    /// Must be called while holding the notification's lock. Returns the
    /// stored notification, expired or not.
    pub async fn expire_if_due(&self, mut notification: Notification) -> AppResult<Notification> {
        let now = self.clock.now();
        if !notification.is_past_expiry(now) {
            return Ok(notification);
        }

        let previous = notification.status;
        notification.status = NotificationStatus::Expired;
        notification.updated_at = now;
        let stored = self.stores.notifications.update(&notification).await?;
        let cancelled = self
            .stores
            .tasks
            .cancel_outstanding(notification.id, now)
            .await?;

        info!(
            notification_id = %notification.id,
            from = %previous,
            cancelled_tasks = cancelled,
            "Notification expired"
        );
        Ok(stored)
    }
}
