//! Read-model records returned by store queries.
//!
//! These are projections joined at read time (item + creator username, audit
//! entry + performer username); the logical contract stays with the domain
//! types in `stockroom-inventory`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{AuditEntryId, ItemId, UserId};
use stockroom_inventory::InventoryItem;

/// An inventory item together with the username of whoever added it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub item: InventoryItem,
    pub added_by_username: String,
}

/// One audit entry joined with the performing user's username.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: AuditEntryId,
    pub action: String,
    pub performed_by: UserId,
    pub performed_by_username: String,
    pub timestamp: DateTime<Utc>,
}

/// An item summary with its full audit trail, newest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct ItemHistory {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub entries: Vec<AuditRecord>,
}
