//! Request context carrying the acting user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_entity::user::UserRole;

/// Who is performing an operation.
///
/// Built by the API layer from the identity headers set by the
/// authenticating gateway, and passed into every service method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: Uuid,
    /// The organization the user acts for.
    pub organization_id: Uuid,
    /// The user's role.
    pub role: UserRole,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, organization_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id,
            organization_id,
            role,
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns whether the current user is medical staff or an admin.
    pub fn is_medical_or_admin(&self) -> bool {
        self.role.is_medical_or_admin()
    }
}
