//! Escalation domain entities.

pub mod delivery;
pub mod model;
pub mod reason;
pub mod status;
pub mod task;

pub use delivery::ChannelDeliveryResult;
pub use model::Escalation;
pub use reason::EscalationReason;
pub use status::EscalationStatus;
pub use task::{EscalationTask, TaskStatus};
