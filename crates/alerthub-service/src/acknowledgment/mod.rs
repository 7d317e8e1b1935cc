//! Acknowledgment recording and the fully-acknowledged transition.

pub mod tracker;

pub use tracker::{AckOutcome, AcknowledgeRequest, AcknowledgmentTracker, BulkAckResult};
