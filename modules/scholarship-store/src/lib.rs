//! Entity store: get-by-key and upsert-by-key for every entity kind.
//!
//! Stores entities as opaque JSON documents keyed by `(kind, id)`. No
//! multi-entity transactions: each save is an independent, idempotent upsert,
//! and re-saving identical values is a no-op in effect.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;
pub use traits::{EntityStore, EntityStoreExt};
