//! User role enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Roles known to the engine.
///
/// Users are owned by the external directory; the role decides who may
/// create, escalate and resolve notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Organization administrator.
    Admin,
    /// Doctors, physiotherapists and trainers.
    MedicalStaff,
    /// Coaching staff.
    Coach,
    /// Athlete.
    Player,
    /// Parent or guardian of a player.
    Parent,
}

vocabulary!(UserRole, "user role", {
    Admin => "admin",
    MedicalStaff => "medical_staff",
    Coach => "coach",
    Player => "player",
    Parent => "parent",
});

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Check if this role may manage notifications.
    pub fn is_medical_or_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::MedicalStaff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_and_display() {
        let role = UserRole::from_str("Medical_Staff").unwrap();
        assert_eq!(role, UserRole::MedicalStaff);
        assert_eq!(role.to_string(), "medical_staff");
        assert!(role.is_medical_or_admin());
        assert!(!UserRole::Coach.is_medical_or_admin());
    }

    #[test]
    fn test_invalid_role() {
        assert!(UserRole::from_str("superuser").is_err());
    }
}
