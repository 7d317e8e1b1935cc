//! Bundle of the repositories the engine persists through.

use std::sync::Arc;

use sqlx::PgPool;

use crate::memory::MemoryStore;
use crate::repositories::{
    AcknowledgmentStore, EscalationStore, EscalationTaskStore, NotificationStore,
    PgAcknowledgmentRepository, PgEscalationRepository, PgEscalationTaskRepository,
    PgNotificationRepository,
};

/// Shared handles to every store.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Notifications.
    pub notifications: Arc<dyn NotificationStore>,
    /// Acknowledgments.
    pub acknowledgments: Arc<dyn AcknowledgmentStore>,
    /// Escalation records.
    pub escalations: Arc<dyn EscalationStore>,
    /// Escalation timers.
    pub tasks: Arc<dyn EscalationTaskStore>,
}

impl Stores {
    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            acknowledgments: Arc::new(PgAcknowledgmentRepository::new(pool.clone())),
            escalations: Arc::new(PgEscalationRepository::new(pool.clone())),
            tasks: Arc::new(PgEscalationTaskRepository::new(pool)),
        }
    }

    /// Stores sharing one in-memory state.
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            notifications: Arc::new(store.clone()),
            acknowledgments: Arc::new(store.clone()),
            escalations: Arc::new(store.clone()),
            tasks: Arc::new(store),
        }
    }
}
