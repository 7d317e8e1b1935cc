//! Escalation task repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::result::AppResult;
use alerthub_entity::escalation::EscalationTask;

use super::{EscalationTaskStore, map_read_error, map_write_error};

/// PostgreSQL escalation task repository.
#[derive(Debug, Clone)]
pub struct PgEscalationTaskRepository {
    pool: PgPool,
}

impl PgEscalationTaskRepository {
    /// Create a new escalation task repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EscalationTaskStore for PgEscalationTaskRepository {
    async fn insert(&self, task: &EscalationTask) -> AppResult<EscalationTask> {
        sqlx::query_as::<_, EscalationTask>(
            "INSERT INTO escalation_tasks (id, notification_id, target_level, due_at, status, \
             attempts, last_error, claimed_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(task.id)
        .bind(task.notification_id)
        .bind(task.target_level)
        .bind(task.due_at)
        .bind(task.status)
        .bind(task.attempts)
        .bind(&task.last_error)
        .bind(task.claimed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "insert escalation task"))
    }

    async fn find_outstanding(&self, notification_id: Uuid) -> AppResult<Option<EscalationTask>> {
        sqlx::query_as::<_, EscalationTask>(
            "SELECT * FROM escalation_tasks \
             WHERE notification_id = $1 AND status IN ('pending', 'running')",
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find outstanding task"))
    }

    async fn cancel_outstanding(&self, notification_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE escalation_tasks SET status = 'cancelled', updated_at = $2 \
             WHERE notification_id = $1 AND status IN ('pending', 'running')",
        )
        .bind(notification_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "cancel escalation task"))?;
        Ok(result.rows_affected())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<EscalationTask>> {
        sqlx::query_as::<_, EscalationTask>(
            "UPDATE escalation_tasks SET status = 'running', claimed_at = $1, updated_at = $1 \
             WHERE id IN ( \
                SELECT id FROM escalation_tasks \
                WHERE (status = 'pending' AND due_at <= $1) \
                   OR (status = 'running' AND claimed_at < $2) \
                ORDER BY due_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT $3 \
             ) RETURNING *",
        )
        .bind(now)
        .bind(lease_cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "claim escalation tasks"))
    }

    async fn rearm(
        &self,
        notification_id: Uuid,
        fired: Option<Uuid>,
        next: Option<&EscalationTask>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_write_error(e, "begin rearm transaction"))?;

        sqlx::query(
            "UPDATE escalation_tasks \
             SET status = CASE WHEN id = $2 THEN 'completed'::escalation_task_status \
                               ELSE 'cancelled'::escalation_task_status END, \
                 updated_at = $3 \
             WHERE notification_id = $1 AND status IN ('pending', 'running')",
        )
        .bind(notification_id)
        .bind(fired)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "retire escalation task"))?;

        if let Some(task) = next {
            sqlx::query(
                "INSERT INTO escalation_tasks (id, notification_id, target_level, due_at, status, \
                 attempts, last_error, claimed_at, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(task.id)
            .bind(task.notification_id)
            .bind(task.target_level)
            .bind(task.due_at)
            .bind(task.status)
            .bind(task.attempts)
            .bind(&task.last_error)
            .bind(task.claimed_at)
            .bind(task.created_at)
            .bind(task.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "arm escalation task"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit rearm transaction"))
    }

    async fn complete(&self, task_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE escalation_tasks SET status = 'completed', updated_at = $2 \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(task_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "complete escalation task"))?;
        Ok(())
    }

    async fn reschedule(
        &self,
        task_id: Uuid,
        due_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE escalation_tasks SET status = 'pending', due_at = $2, last_error = $3, \
             attempts = attempts + 1, claimed_at = NULL, updated_at = $4 \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(task_id)
        .bind(due_at)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "reschedule escalation task"))?;
        Ok(())
    }
}
