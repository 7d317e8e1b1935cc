//! `AuthUser` extractor: reads the identity headers set by the
//! authenticating gateway and builds the request context.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_entity::user::UserRole;
use alerthub_service::RequestContext;

use crate::error::ApiError;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the acting user's organization.
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";
/// Header carrying the acting user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Header carrying the notification access PIN.
pub const PIN_HEADER: &str = "x-notification-pin";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = required_header(&parts.headers, USER_ID_HEADER)?;
        let organization_id = required_header(&parts.headers, ORGANIZATION_ID_HEADER)?;
        let role = required_header(&parts.headers, USER_ROLE_HEADER)?;

        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::authentication(format!("Invalid {USER_ID_HEADER} header")))?;
        let organization_id = Uuid::parse_str(organization_id).map_err(|_| {
            AppError::authentication(format!("Invalid {ORGANIZATION_ID_HEADER} header"))
        })?;
        let role = UserRole::from_str(role)
            .map_err(|e| AppError::authentication(e.message))?;

        Ok(AuthUser(RequestContext::new(user_id, organization_id, role)))
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::authentication(format!("Missing {name} header")))
}

/// The access PIN header, when present.
pub fn access_pin(headers: &HeaderMap) -> Option<&str> {
    headers.get(PIN_HEADER).and_then(|v| v.to_str().ok())
}
