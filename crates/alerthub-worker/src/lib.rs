//! Background work for AlertHub.
//!
//! This crate provides:
//! - A runner that claims due escalation tasks and fires them
//! - A cron scheduler for the scheduled-send, expiry, redaction and
//!   lock-pruning sweeps

pub mod runner;
pub mod scheduler;

pub use runner::EscalationRunner;
pub use scheduler::SweepScheduler;
