//! Target resolution for an escalation level.

use tracing::warn;
use uuid::Uuid;

use alerthub_core::result::AppResult;
use alerthub_core::traits::directory::Directory;
use alerthub_delivery::Recipient;
use alerthub_entity::escalation::Escalation;
use alerthub_entity::notification::{
    DeliveryChannel, EmergencyContact, EscalationLevelPolicy, Notification,
};

use crate::notification::targeting::dedup;

/// Who an escalation should reach and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPlan {
    /// Users named explicitly.
    pub users: Vec<Uuid>,
    /// Roles to expand through the directory.
    pub roles: Vec<String>,
    /// Include the payload's emergency contacts.
    pub use_emergency_contacts: bool,
    /// Channel override.
    pub channels: Option<Vec<DeliveryChannel>>,
    /// Message override.
    pub message: Option<String>,
}

impl TargetPlan {
    /// Whether the plan names nobody.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.roles.is_empty() && !self.use_emergency_contacts
    }
}

impl From<&EscalationLevelPolicy> for TargetPlan {
    fn from(policy: &EscalationLevelPolicy) -> Self {
        Self {
            users: policy.target_users.clone(),
            roles: policy.target_roles.clone(),
            use_emergency_contacts: policy.use_emergency_contacts,
            channels: policy.channels.clone(),
            message: policy.message.clone(),
        }
    }
}

/// Resolved audience of one escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTargets {
    /// Directory users.
    pub users: Vec<Uuid>,
    /// Roles that were expanded.
    pub roles: Vec<String>,
    /// Emergency contacts.
    pub contacts: Vec<EmergencyContact>,
}

impl LevelTargets {
    /// Resolve a plan for a notification: named users, role members of the
    /// notification's organization and, if flagged, its emergency contacts.
    ///
    /// Named users outside the notification's organization are dropped.
    pub async fn resolve(
        directory: &dyn Directory,
        notification: &Notification,
        plan: &TargetPlan,
    ) -> AppResult<Self> {
        let mut users = Vec::with_capacity(plan.users.len());
        for &user_id in &plan.users {
            match directory.find_user(user_id).await? {
                Some(user) if user.organization_id == notification.organization_id => {
                    users.push(user_id);
                }
                _ => warn!(
                    notification_id = %notification.id,
                    user_id = %user_id,
                    "Escalation target is not a member of the organization; skipped"
                ),
            }
        }
        for role in &plan.roles {
            users.extend(
                directory
                    .users_with_role(notification.organization_id, role)
                    .await?,
            );
        }
        let contacts = if plan.use_emergency_contacts {
            notification.payload.emergency_contacts.clone()
        } else {
            Vec::new()
        };
        Ok(Self {
            users: dedup(users),
            roles: plan.roles.clone(),
            contacts,
        })
    }

    /// Everyone to dispatch to.
    pub fn recipients(&self) -> Vec<Recipient> {
        self.users
            .iter()
            .copied()
            .map(Recipient::from)
            .chain(self.contacts.iter().cloned().map(Recipient::EmergencyContact))
            .collect()
    }

    /// Whether nobody was resolved.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.contacts.is_empty()
    }
}

impl From<&Escalation> for LevelTargets {
    fn from(escalation: &Escalation) -> Self {
        Self {
            users: escalation.target_user_ids.clone(),
            roles: escalation.target_roles.clone(),
            contacts: escalation.emergency_contacts.clone(),
        }
    }
}
