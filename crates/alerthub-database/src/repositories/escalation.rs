//! Escalation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use alerthub_core::result::AppResult;
use alerthub_entity::escalation::Escalation;

use super::{EscalationStore, map_read_error, map_write_error};

/// PostgreSQL escalation repository.
#[derive(Debug, Clone)]
pub struct PgEscalationRepository {
    pool: PgPool,
}

impl PgEscalationRepository {
    /// Create a new escalation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EscalationStore for PgEscalationRepository {
    async fn insert(&self, e: &Escalation) -> AppResult<Escalation> {
        sqlx::query_as::<_, Escalation>(
            "INSERT INTO escalations (id, notification_id, level, reason, target_user_ids, \
             target_roles, emergency_contacts, channels, message, delivery_results, triggered_by, \
             status, created_at, completed_at, dispatch_claimed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(e.id)
        .bind(e.notification_id)
        .bind(e.level)
        .bind(e.reason)
        .bind(&e.target_user_ids)
        .bind(&e.target_roles)
        .bind(Json(&e.emergency_contacts))
        .bind(Json(&e.channels))
        .bind(&e.message)
        .bind(Json(&e.delivery_results))
        .bind(e.triggered_by)
        .bind(e.status)
        .bind(e.created_at)
        .bind(e.completed_at)
        .bind(e.dispatch_claimed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "insert escalation"))
    }

    async fn finish(&self, e: &Escalation) -> AppResult<()> {
        sqlx::query(
            "UPDATE escalations SET status = $2, delivery_results = $3, completed_at = $4 \
             WHERE id = $1",
        )
        .bind(e.id)
        .bind(e.status)
        .bind(Json(&e.delivery_results))
        .bind(e.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "finish escalation"))?;
        Ok(())
    }

    async fn list_by_notification(&self, notification_id: Uuid) -> AppResult<Vec<Escalation>> {
        sqlx::query_as::<_, Escalation>(
            "SELECT * FROM escalations WHERE notification_id = $1 ORDER BY level ASC",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_read_error(err, "list escalations"))
    }

    async fn list_by_notifications(&self, notification_ids: &[Uuid]) -> AppResult<Vec<Escalation>> {
        sqlx::query_as::<_, Escalation>(
            "SELECT * FROM escalations WHERE notification_id = ANY($1) \
             ORDER BY notification_id, level ASC",
        )
        .bind(notification_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_read_error(err, "list escalations"))
    }

    async fn claim_interrupted(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Escalation>> {
        sqlx::query_as::<_, Escalation>(
            "UPDATE escalations SET dispatch_claimed_at = $1 \
             WHERE id IN ( \
                SELECT id FROM escalations \
                WHERE status = 'in_progress' \
                  AND (dispatch_claimed_at IS NULL OR dispatch_claimed_at < $2) \
                ORDER BY created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT $3 \
             ) RETURNING *",
        )
        .bind(now)
        .bind(lease_cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "claim interrupted escalations"))
    }
}
