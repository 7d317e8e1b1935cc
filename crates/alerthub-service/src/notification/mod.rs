//! Notification lifecycle: creation, sending, reads, resolution, expiry,
//! scheduled sends and content redaction.

pub mod detail;
pub mod lifecycle;
pub mod request;
pub mod targeting;

pub use detail::{AcknowledgmentProgress, NotificationDetail, SendOutcome};
pub use lifecycle::NotificationService;
pub use request::CreateNotification;
