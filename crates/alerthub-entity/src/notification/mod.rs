//! Notification domain entities.

pub mod channel;
pub mod medical_type;
pub mod model;
pub mod payload;
pub mod policy;
pub mod privacy;
pub mod status;
pub mod target;
pub mod urgency;

pub use channel::DeliveryChannel;
pub use medical_type::MedicalType;
pub use model::Notification;
pub use payload::{Attachment, EmergencyContact, MedicalPayload};
pub use policy::EscalationLevelPolicy;
pub use privacy::PrivacySettings;
pub use status::NotificationStatus;
pub use target::TargetType;
pub use urgency::UrgencyLevel;
