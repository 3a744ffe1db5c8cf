//! Infrastructure layer: entity store adapters and the access service.

pub mod access;
pub mod entity_store;

pub use access::{AccessError, AccessService};
pub use entity_store::{EntityStore, EntityStoreError, InMemoryEntityStore, PostgresEntityStore};
