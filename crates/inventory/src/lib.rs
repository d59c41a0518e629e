//! Inventory domain module.
//!
//! This crate contains the business rules for inventory: the item lifecycle
//! (active → soft-deleted → restored/purged), guarded quantity arithmetic,
//! the merge-on-insert policy, and the closed audit-action taxonomy. All of
//! it is deterministic domain logic (no IO, no HTTP, no storage) — the store
//! layer executes these rules inside one transaction per operation.

pub mod audit;
pub mod item;
pub mod ops;

pub use audit::{AuditAction, AuditEntry};
pub use item::InventoryItem;
pub use ops::{plan_create, CreateItem, CreatePlan, MoveDirection, StockMove, UpdateItem};
