//! Collaborator traits defined in `alerthub-core` and implemented by other crates.

pub mod directory;

pub use directory::{Directory, DirectoryUser};
