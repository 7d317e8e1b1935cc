//! Per-notification async mutexes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Serialises read-decide-write sequences on one notification.
///
/// Operations on different notifications never contend.
#[derive(Debug, Default)]
pub struct NotificationLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl NotificationLocks {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a notification.
    pub async fn lock(&self, notification_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(notification_id).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drop the mutexes nobody holds or waits for. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of tracked notifications.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no lock is tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
