//! Structured medical payload carried by a notification.

use serde::{Deserialize, Serialize};

/// Medical details attached to a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalPayload {
    /// Vital signs keyed by measurement name.
    #[serde(default)]
    pub vitals: Option<serde_json::Value>,
    /// Medications involved.
    #[serde(default)]
    pub medications: Vec<String>,
    /// Activity restrictions in force.
    #[serde(default)]
    pub restrictions: Vec<String>,
    /// People to reach when the escalation policy asks for emergency contacts.
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    /// References to emergency protocol documents.
    #[serde(default)]
    pub protocol_references: Vec<String>,
}

impl MedicalPayload {
    /// Whether every field is empty.
    pub fn is_empty(&self) -> bool {
        self.vitals.is_none()
            && self.medications.is_empty()
            && self.restrictions.is_empty()
            && self.emergency_contacts.is_empty()
            && self.protocol_references.is_empty()
    }
}

/// An out-of-directory person reachable by phone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship to the subject (parent, spouse, ...).
    #[serde(default)]
    pub relationship: Option<String>,
    /// Optional email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// A file reference attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name.
    pub name: String,
    /// Location of the file.
    pub url: String,
    /// MIME type.
    #[serde(default)]
    pub content_type: Option<String>,
}
