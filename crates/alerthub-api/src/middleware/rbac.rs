//! RBAC helpers for role-based route guarding.

use alerthub_core::error::AppError;

use crate::extractors::AuthUser;

/// Checks that the authenticated user is medical staff or an admin.
pub fn require_medical_or_admin(auth: &AuthUser) -> Result<(), AppError> {
    if !auth.is_medical_or_admin() {
        return Err(AppError::authorization(
            "Medical staff or Admin access required",
        ));
    }
    Ok(())
}
