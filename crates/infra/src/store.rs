//! Repository traits for the Inventory Store and the user directory.

use async_trait::async_trait;

use stockroom_auth::User;
use stockroom_core::{ItemId, UserId};
use stockroom_inventory::{CreateItem, InventoryItem, StockMove, UpdateItem};

use crate::error::StoreError;
use crate::records::{AuditRecord, ItemHistory, ItemRecord};

/// Which items a listing should return.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ItemFilter {
    /// Only active items (the default listing).
    Active,
    /// Only soft-deleted items (the recycle bin).
    Deleted,
    /// Everything, regardless of deletion state.
    All,
}

/// The Inventory Store: authoritative item state plus the append-only audit
/// log, mutated together in one atomic unit per operation.
///
/// Every mutating method takes the acting user explicitly — actor identity is
/// never ambient state.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Create an item, or merge into an active item with the same trimmed,
    /// case-insensitive `(name, category)`. Returns the resulting item and
    /// whether the request was merged.
    async fn create_item(
        &self,
        request: CreateItem,
        actor: UserId,
    ) -> Result<(InventoryItem, bool), StoreError>;

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemRecord>, StoreError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// Overwrite all mutable fields. Soft-deleted items are `NotFound`.
    async fn update_item(
        &self,
        id: ItemId,
        update: UpdateItem,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError>;

    /// Soft-delete. Already-deleted items are `NotFound`.
    async fn soft_delete_item(&self, id: ItemId, actor: UserId) -> Result<(), StoreError>;

    /// Restore a soft-deleted item. Active items are a `Conflict`.
    async fn restore_item(&self, id: ItemId, actor: UserId)
        -> Result<InventoryItem, StoreError>;

    /// Irrevocably remove an item and its audit entries together. Appends no
    /// audit entry (terminal transition).
    async fn purge_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Guarded quantity adjustment. Soft-deleted items are `NotFound`;
    /// an `Out` move beyond the current quantity is a validation error.
    async fn move_stock(
        &self,
        id: ItemId,
        mv: StockMove,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError>;

    /// Audit trail for one active item, newest entry first.
    async fn audit_for_item(
        &self,
        id: ItemId,
    ) -> Result<(InventoryItem, Vec<AuditRecord>), StoreError>;

    /// All active items with their audit trails, each newest-first.
    async fn audit_all(&self) -> Result<Vec<ItemHistory>, StoreError>;
}

/// User directory consumed by registration/login.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A duplicate username is a `Conflict`.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}
