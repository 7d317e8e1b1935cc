//! Escalation level policy.

use alerthub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::DeliveryChannel;

/// Configuration of one escalation level.
///
/// The first entry describes level 1, which fires after the notification's
/// acknowledgment timeout; its `delay_minutes` must be 0. Later entries fire
/// `delay_minutes` after the previous level fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationLevelPolicy {
    /// Minutes to wait after the previous level before firing this one.
    /// Always 0 for level 1.
    #[serde(default)]
    pub delay_minutes: i64,
    /// Roles whose members are notified at this level.
    #[serde(default)]
    pub target_roles: Vec<String>,
    /// Users notified at this level.
    #[serde(default)]
    pub target_users: Vec<Uuid>,
    /// Also reach the emergency contacts embedded in the payload.
    #[serde(default)]
    pub use_emergency_contacts: bool,
    /// Channels to use instead of the notification's own channels.
    #[serde(default)]
    pub channels: Option<Vec<DeliveryChannel>>,
    /// Message to send instead of the reason template.
    #[serde(default)]
    pub message: Option<String>,
}

impl EscalationLevelPolicy {
    /// Check that the level is well-formed. `level` is 1-based.
    pub fn validate(&self, level: usize) -> AppResult<()> {
        if self.delay_minutes < 0 {
            return Err(AppError::validation(format!(
                "Escalation level {level}: delay_minutes must not be negative"
            )));
        }
        if level == 1 && self.delay_minutes != 0 {
            return Err(AppError::validation(
                "Escalation level 1 fires after acknowledgment_timeout_minutes; its delay_minutes must be 0",
            ));
        }
        if level > 1 && self.delay_minutes == 0 {
            return Err(AppError::validation(format!(
                "Escalation level {level}: delay_minutes must be at least 1"
            )));
        }
        if self.target_roles.is_empty() && self.target_users.is_empty() && !self.use_emergency_contacts
        {
            return Err(AppError::validation(format!(
                "Escalation level {level}: no targets configured"
            )));
        }
        if self.target_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "Escalation level {level}: target roles must not be blank"
            )));
        }
        if matches!(&self.channels, Some(c) if c.is_empty()) {
            return Err(AppError::validation(format!(
                "Escalation level {level}: channel override must not be empty"
            )));
        }
        Ok(())
    }
}
