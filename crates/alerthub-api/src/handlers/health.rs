//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use alerthub_core::config::StoreBackend;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
///
/// Answers 503 when the database probe fails.
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let store = match state.config.database.backend {
        StoreBackend::Postgres => "postgres",
        StoreBackend::Memory => "memory",
    };

    let database_reachable = match &state.database {
        Some(pool) => Some(pool.health_check().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Database health check failed");
            false
        })),
        None => None,
    };
    let healthy = database_reachable.unwrap_or(true);

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            store: store.to_string(),
            database_reachable,
        })),
    )
}
