//! Manual escalation handler.

use axum::Json;
use axum::extract::{Path, State};

use alerthub_service::escalation::EscalationOutcome;

use crate::dto::request::EscalateRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::middleware::rbac::require_medical_or_admin;
use crate::state::AppState;

/// POST /api/notifications/{id}/escalate
///
/// `data` is `null` when the policy has no further level to apply.
pub async fn escalate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<EscalateRequest>,
) -> Result<Json<ApiResponse<Option<EscalationOutcome>>>, ApiError> {
    require_medical_or_admin(&auth)?;
    let id = parse_uuid(&id)?;
    let outcome = state.engine.escalate(&auth, id, &req.into()).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
