//! Medical notification type enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// What kind of medical event a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "medical_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MedicalType {
    /// A new injury was reported.
    InjuryAlert,
    /// Treatment must be given.
    TreatmentRequired,
    /// Medication is due.
    MedicationReminder,
    /// An emergency protocol is in effect.
    EmergencyProtocol,
    /// General health status change.
    HealthUpdate,
    /// Isolation or quarantine instruction.
    QuarantineNotice,
    /// Clearance to return to play.
    ReturnToPlay,
}

vocabulary!(MedicalType, "medical type", {
    InjuryAlert => "injury_alert",
    TreatmentRequired => "treatment_required",
    MedicationReminder => "medication_reminder",
    EmergencyProtocol => "emergency_protocol",
    HealthUpdate => "health_update",
    QuarantineNotice => "quarantine_notice",
    ReturnToPlay => "return_to_play",
});
