//! Escalation engine: durable timers, target resolution per level and
//! chaining to the next level.

pub mod engine;
pub mod message;
pub mod targets;

pub use engine::{EscalationEngine, EscalationOutcome, FireOutcome, ManualEscalation};
pub use targets::{LevelTargets, TargetPlan};
