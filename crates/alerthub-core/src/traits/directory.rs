//! Directory service contract.
//!
//! The directory owns users, teams, organizations and roles. The engine only
//! needs to expand targets into user ids and describe an acknowledging user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::AppResult;

/// A user as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// User identifier.
    pub id: Uuid,
    /// Organization the user belongs to.
    pub organization_id: Uuid,
    /// Human-readable name.
    pub display_name: String,
    /// Role name (e.g. `"medical_staff"`, `"coach"`).
    pub role: String,
    /// Teams the user is a member of.
    #[serde(default)]
    pub team_ids: Vec<Uuid>,
}

/// Resolves targets and users.
///
/// Implementations return an empty list for unknown teams or organizations
/// and reserve errors for an unreachable backend.
#[async_trait]
pub trait Directory: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a single user.
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<DirectoryUser>>;

    /// All members of a team.
    async fn team_members(&self, team_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// All members of an organization.
    async fn organization_members(&self, organization_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Members of an organization holding the given role.
    async fn users_with_role(&self, organization_id: Uuid, role: &str) -> AppResult<Vec<Uuid>>;
}
