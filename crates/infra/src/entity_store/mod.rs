//! Read-only boundary over the access catalog and user grants.
//!
//! Each query returns flat, denormalized rows; trees are rebuilt in-process
//! by `warden-auth`.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;
pub use r#trait::{EntityStore, EntityStoreError};
