//! Compliance report handler.

use axum::Json;
use axum::extract::{Query, State};

use alerthub_service::compliance::ComplianceReport;

use crate::dto::request::ComplianceReportQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_medical_or_admin;
use crate::state::AppState;

/// GET /api/compliance/report?start=&end=
pub async fn compliance_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ComplianceReportQuery>,
) -> Result<Json<ApiResponse<ComplianceReport>>, ApiError> {
    require_medical_or_admin(&auth)?;
    let report = state.reporter.report(&auth, query.start, query.end).await?;
    Ok(Json(ApiResponse::ok(report)))
}
