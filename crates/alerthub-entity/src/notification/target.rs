//! Notification target type enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// How the recipients of a notification are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "target_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A single player; `target_id` is the player's user id.
    Player,
    /// Every member of a team.
    Team,
    /// Every member of an organization.
    Organization,
    /// An explicit list of user ids.
    CustomGroup,
}

vocabulary!(TargetType, "target type", {
    Player => "player",
    Team => "team",
    Organization => "organization",
    CustomGroup => "custom_group",
});

impl TargetType {
    /// Whether the target is addressed by `target_id` rather than a list.
    pub fn uses_target_id(&self) -> bool {
        !matches!(self, Self::CustomGroup)
    }
}
