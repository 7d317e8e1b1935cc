//! Route definitions for the AlertHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with every route and the request logger.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(compliance_routes())
        .merge(vocabulary_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Notification lifecycle, acknowledgment and escalation endpoints
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications)
                .post(handlers::notification::create_notification),
        )
        .route(
            "/notifications/acknowledge/bulk",
            post(handlers::acknowledgment::bulk_acknowledge),
        )
        .route(
            "/notifications/{id}",
            get(handlers::notification::get_notification),
        )
        .route(
            "/notifications/{id}/acknowledge",
            post(handlers::acknowledgment::acknowledge),
        )
        .route(
            "/notifications/{id}/escalate",
            post(handlers::escalation::escalate),
        )
        .route(
            "/notifications/{id}/resolve",
            post(handlers::notification::resolve_notification),
        )
}

/// Compliance reporting
fn compliance_routes() -> Router<AppState> {
    Router::new().route(
        "/compliance/report",
        get(handlers::compliance::compliance_report),
    )
}

/// Static vocabularies
fn vocabulary_routes() -> Router<AppState> {
    Router::new()
        .route("/vocabulary", get(handlers::vocabulary::list_vocabularies))
        .route("/vocabulary/{kind}", get(handlers::vocabulary::get_vocabulary))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
