//! Notification privacy settings.

use serde::{Deserialize, Serialize};

/// Access restrictions for a notification's detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettings {
    /// Only medical staff, admins, the creator and required acknowledgers may read it.
    #[serde(default)]
    pub restrict_to_medical_staff: bool,
    /// Readers must present the access PIN.
    #[serde(default)]
    pub require_pin: bool,
    /// Redact the medical content this many hours after the notification is final.
    #[serde(default)]
    pub auto_delete_after_hours: Option<i64>,
}
