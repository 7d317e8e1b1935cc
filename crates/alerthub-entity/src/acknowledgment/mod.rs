//! Acknowledgment domain entities.

pub mod method;
pub mod model;

pub use method::AcknowledgmentMethod;
pub use model::Acknowledgment;
