//! Route handlers organized by domain.

pub mod acknowledgment;
pub mod compliance;
pub mod escalation;
pub mod health;
pub mod notification;
pub mod vocabulary;
