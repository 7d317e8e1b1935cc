//! Acknowledgment handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use alerthub_service::acknowledgment::{AckOutcome, AcknowledgeRequest, BulkAckResult};

use crate::dto::request::{AcknowledgeNotificationRequest, BulkAcknowledgeRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/notifications/{id}/acknowledge
///
/// Returns 201 for a new acknowledgment and 200 when the caller had
/// already acknowledged.
pub async fn acknowledge(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AcknowledgeNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AckOutcome>>), ApiError> {
    let id = parse_uuid(&id)?;
    let outcome = state.tracker.acknowledge(&auth, id, &req.into()).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::ok(outcome))))
}

/// POST /api/notifications/acknowledge/bulk
pub async fn bulk_acknowledge(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<BulkAcknowledgeRequest>,
) -> Result<Json<ApiResponse<Vec<BulkAckResult>>>, ApiError> {
    let details = AcknowledgeRequest::from(req.acknowledgment);
    let results = state
        .tracker
        .bulk_acknowledge(&auth, &req.notification_ids, &details)
        .await;

    tracing::info!(
        user_id = %auth.user_id,
        requested = req.notification_ids.len(),
        succeeded = results.iter().filter(|r| r.success).count(),
        "Bulk acknowledgment processed"
    );
    Ok(Json(ApiResponse::ok(results)))
}
