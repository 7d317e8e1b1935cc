//! # alerthub-database
//!
//! PostgreSQL connection management, the repository traits the engine
//! persists through, their sqlx implementations and a process-local
//! in-memory implementation.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod stores;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use stores::Stores;
