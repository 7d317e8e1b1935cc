//! Notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};

use alerthub_entity::notification::Notification;
use alerthub_service::notification::{NotificationDetail, SendOutcome};

use crate::dto::request::{CreateNotificationRequest, NotificationListQuery, ResolveRequest};
use crate::dto::response::{ApiResponse, NotificationSummary, PaginatedResponse};
use crate::error::ApiError;
use crate::extractors::auth::access_pin;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::middleware::rbac::require_medical_or_admin;
use crate::state::AppState;

/// POST /api/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SendOutcome>>), ApiError> {
    require_medical_or_admin(&auth)?;
    let outcome = state.notifications.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome))))
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<NotificationSummary>>>, ApiError> {
    let page = state
        .notifications
        .list_active(&auth, &filter.into(), &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(
        page.map(NotificationSummary::from).into(),
    )))
}

/// GET /api/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<NotificationDetail>>, ApiError> {
    let id = parse_uuid(&id)?;
    let detail = state
        .notifications
        .get(&auth, id, access_pin(&headers))
        .await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/notifications/{id}/resolve
pub async fn resolve_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ResolveRequest>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    require_medical_or_admin(&auth)?;
    let id = parse_uuid(&id)?;
    let notification = state.notifications.resolve(&auth, id, req.notes).await?;
    Ok(Json(ApiResponse::ok(notification)))
}
