//! Acknowledgment repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::result::AppResult;
use alerthub_entity::acknowledgment::Acknowledgment;

use super::{AcknowledgmentStore, map_read_error, map_write_error};

/// PostgreSQL acknowledgment repository.
#[derive(Debug, Clone)]
pub struct PgAcknowledgmentRepository {
    pool: PgPool,
}

impl PgAcknowledgmentRepository {
    /// Create a new acknowledgment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcknowledgmentStore for PgAcknowledgmentRepository {
    async fn insert(&self, ack: &Acknowledgment) -> AppResult<Acknowledgment> {
        sqlx::query_as::<_, Acknowledgment>(
            "INSERT INTO acknowledgments (id, notification_id, user_id, user_name, user_role, \
             method, message, device_info, location, response_time_seconds, escalation_level, \
             is_emergency_contact, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(ack.id)
        .bind(ack.notification_id)
        .bind(ack.user_id)
        .bind(&ack.user_name)
        .bind(&ack.user_role)
        .bind(ack.method)
        .bind(&ack.message)
        .bind(&ack.device_info)
        .bind(&ack.location)
        .bind(ack.response_time_seconds)
        .bind(ack.escalation_level)
        .bind(ack.is_emergency_contact)
        .bind(ack.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "insert acknowledgment"))
    }

    async fn find_by_user(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Acknowledgment>> {
        sqlx::query_as::<_, Acknowledgment>(
            "SELECT * FROM acknowledgments WHERE notification_id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find acknowledgment"))
    }

    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Acknowledgment>> {
        sqlx::query_as::<_, Acknowledgment>(
            "SELECT * FROM acknowledgments WHERE notification_id = $1 ORDER BY created_at ASC",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "list acknowledgments"))
    }

    async fn list_by_notifications(
        &self,
        notification_ids: &[Uuid],
    ) -> AppResult<Vec<Acknowledgment>> {
        sqlx::query_as::<_, Acknowledgment>(
            "SELECT * FROM acknowledgments WHERE notification_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(notification_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "list acknowledgments"))
    }
}
