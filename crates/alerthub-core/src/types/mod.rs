//! Core type definitions used across the AlertHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
