//! Static vocabulary listings.

use std::fmt::Display;

use axum::Json;
use axum::extract::Path;

use alerthub_core::error::AppError;
use alerthub_entity::acknowledgment::AcknowledgmentMethod;
use alerthub_entity::escalation::EscalationReason;
use alerthub_entity::notification::{
    DeliveryChannel, MedicalType, NotificationStatus, TargetType, UrgencyLevel,
};

use crate::dto::response::{ApiResponse, VocabularyResponse};
use crate::error::ApiError;

fn entry<T: Display>(kind: &str, all: &[T]) -> VocabularyResponse {
    VocabularyResponse {
        kind: kind.to_string(),
        values: all.iter().map(ToString::to_string).collect(),
    }
}

/// Every vocabulary the API accepts.
pub fn vocabularies() -> Vec<VocabularyResponse> {
    vec![
        entry("urgency_levels", UrgencyLevel::ALL),
        entry("medical_types", MedicalType::ALL),
        entry("target_types", TargetType::ALL),
        entry("delivery_channels", DeliveryChannel::ALL),
        entry("acknowledgment_methods", AcknowledgmentMethod::ALL),
        entry("escalation_reasons", EscalationReason::ALL),
        entry("notification_statuses", NotificationStatus::ALL),
    ]
}

/// GET /api/vocabulary
pub async fn list_vocabularies() -> Json<ApiResponse<Vec<VocabularyResponse>>> {
    Json(ApiResponse::ok(vocabularies()))
}

/// GET /api/vocabulary/{kind}
pub async fn get_vocabulary(
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<VocabularyResponse>>, ApiError> {
    let vocabulary = vocabularies()
        .into_iter()
        .find(|v| v.kind == kind)
        .ok_or_else(|| AppError::not_found(format!("Unknown vocabulary '{kind}'")))?;
    Ok(Json(ApiResponse::ok(vocabulary)))
}
