//! # alerthub-core
//!
//! Core crate for AlertHub. Contains the unified error system, configuration
//! schemas, the clock abstraction, collaborator traits (directory), and
//! pagination types.
//!
//! This crate has **no** internal dependencies on other AlertHub crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
