//! `stockroom-infra` — the Inventory Store and Audit Log.
//!
//! The domain rules live in `stockroom-inventory`; this crate executes them
//! against storage. Every mutating operation performs its item write and its
//! audit append as one atomic unit: the in-memory backend serializes
//! operations behind a single mutex, the Postgres backend wraps each
//! operation in a transaction and locks the touched row with
//! `SELECT ... FOR UPDATE` so concurrent quantity changes cannot race.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{AuditRecord, ItemHistory, ItemRecord};
pub use store::{InventoryStore, ItemFilter, UserStore};

#[cfg(test)]
mod store_tests;
