//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::types::pagination::{PageRequest, PageResponse};
use alerthub_entity::notification::Notification;

use super::{NotificationFilter, NotificationStore, map_read_error, map_write_error};

const ACTIVE_FILTER: &str = "organization_id = $1 \
     AND status NOT IN ('resolved', 'expired') \
     AND ($2::urgency_level IS NULL OR urgency_level = $2) \
     AND ($3::medical_type IS NULL OR medical_type = $3) \
     AND ($4::target_type IS NULL OR target_type = $4) \
     AND ($5::boolean IS NULL OR requires_acknowledgment = $5) \
     AND ($6::uuid IS NULL OR created_by = $6)";

/// PostgreSQL notification repository.
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn insert(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, organization_id, team_id, created_by, urgency_level, \
             medical_type, title, message, payload, target_type, target_id, recipient_ids, \
             delivery_channels, channel_config, requires_acknowledgment, \
             acknowledgment_timeout_minutes, required_acknowledgers, min_acknowledgments_required, \
             enable_escalation, escalation_policy, attachments, privacy, access_pin_hash, status, \
             scheduled_for, sent_at, expires_at, total_recipients, acknowledged_count, \
             escalation_level, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33) \
             RETURNING *",
        )
        .bind(n.id)
        .bind(n.organization_id)
        .bind(n.team_id)
        .bind(n.created_by)
        .bind(n.urgency_level)
        .bind(n.medical_type)
        .bind(&n.title)
        .bind(&n.message)
        .bind(Json(&n.payload))
        .bind(n.target_type)
        .bind(n.target_id)
        .bind(&n.recipient_ids)
        .bind(Json(&n.delivery_channels))
        .bind(&n.channel_config)
        .bind(n.requires_acknowledgment)
        .bind(n.acknowledgment_timeout_minutes)
        .bind(&n.required_acknowledgers)
        .bind(n.min_acknowledgments_required)
        .bind(n.enable_escalation)
        .bind(Json(&n.escalation_policy))
        .bind(Json(&n.attachments))
        .bind(Json(&n.privacy))
        .bind(&n.access_pin_hash)
        .bind(n.status)
        .bind(n.scheduled_for)
        .bind(n.sent_at)
        .bind(n.expires_at)
        .bind(n.total_recipients)
        .bind(n.acknowledged_count)
        .bind(n.escalation_level)
        .bind(n.version)
        .bind(n.created_at)
        .bind(n.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "insert notification"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "find notification"))
    }

    async fn update(&self, n: &Notification) -> AppResult<Notification> {
        let updated = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET title = $3, message = $4, payload = $5, recipient_ids = $6, \
             attachments = $7, delivery_results = $21, status = $8, sent_at = $9, first_acknowledged_at = $10, \
             fully_acknowledged_at = $11, escalated_at = $12, resolved_at = $13, resolved_by = $14, \
             resolution_notes = $15, redacted_at = $16, total_recipients = $17, \
             acknowledged_count = $18, escalation_level = $19, updated_at = $20, \
             version = version + 1 \
             WHERE id = $1 AND version = $2 \
             RETURNING *",
        )
        .bind(n.id)
        .bind(n.version)
        .bind(&n.title)
        .bind(&n.message)
        .bind(Json(&n.payload))
        .bind(&n.recipient_ids)
        .bind(Json(&n.attachments))
        .bind(n.status)
        .bind(n.sent_at)
        .bind(n.first_acknowledged_at)
        .bind(n.fully_acknowledged_at)
        .bind(n.escalated_at)
        .bind(n.resolved_at)
        .bind(n.resolved_by)
        .bind(&n.resolution_notes)
        .bind(n.redacted_at)
        .bind(n.total_recipients)
        .bind(n.acknowledged_count)
        .bind(n.escalation_level)
        .bind(n.updated_at)
        .bind(Json(&n.delivery_results))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "update notification"))?;

        updated.ok_or_else(|| {
            AppError::conflict(format!(
                "Notification {} was modified concurrently (expected version {})",
                n.id, n.version
            ))
        })
    }

    async fn list_active(
        &self,
        organization_id: Uuid,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE {ACTIVE_FILTER}"))
                .bind(organization_id)
                .bind(filter.urgency_level)
                .bind(filter.medical_type)
                .bind(filter.target_type)
                .bind(filter.requires_acknowledgment)
                .bind(filter.created_by)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_read_error(e, "count notifications"))?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            "SELECT * FROM notifications WHERE {ACTIVE_FILTER} \
             ORDER BY created_at DESC LIMIT $7 OFFSET $8"
        ))
        .bind(organization_id)
        .bind(filter.urgency_level)
        .bind(filter.medical_type)
        .bind(filter.target_type)
        .bind(filter.requires_acknowledgment)
        .bind(filter.created_by)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "list notifications"))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn find_created_between(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE organization_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at ASC",
        )
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "load notifications for window"))
    }

    async fn find_due_drafts(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status = 'draft' AND scheduled_for <= $1 \
             ORDER BY scheduled_for ASC LIMIT $2",
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find due drafts"))
    }

    async fn find_expirable(&self, now: DateTime<Utc>, limit: u32) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status IN ('draft', 'pending', 'delivered', 'escalated') AND expires_at < $1 \
             ORDER BY expires_at ASC LIMIT $2",
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find expirable notifications"))
    }

    async fn find_redaction_candidates(&self, limit: u32) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status IN ('resolved', 'expired') AND redacted_at IS NULL \
             AND privacy ->> 'auto_delete_after_hours' IS NOT NULL \
             ORDER BY updated_at ASC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find redaction candidates"))
    }
}
