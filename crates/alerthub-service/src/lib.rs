//! # alerthub-service
//!
//! Business logic for AlertHub: the notification lifecycle manager, the
//! acknowledgment tracker, the escalation engine and the compliance
//! reporter. Services share a [`deps::ServiceDeps`] bundle (stores,
//! directory, clock and the per-notification locks) and are wired together
//! by constructor injection.

pub mod access;
pub mod acknowledgment;
pub mod compliance;
pub mod context;
pub mod deps;
pub mod directory;
pub mod escalation;
pub mod locks;
pub mod notification;
pub mod retry;

#[cfg(test)]
mod testing;

pub use acknowledgment::AcknowledgmentTracker;
pub use compliance::ComplianceReporter;
pub use context::RequestContext;
pub use deps::ServiceDeps;
pub use directory::StaticDirectory;
pub use escalation::EscalationEngine;
pub use locks::NotificationLocks;
pub use notification::NotificationService;
