use serde::Deserialize;

use stockroom_infra::{AuditRecord, ItemHistory, ItemRecord};
use stockroom_inventory::InventoryItem;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reorder_threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reorder_threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MoveStockRequest {
    pub direction: String,
    pub amount: i64,
    pub reason: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &InventoryItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "category": item.category,
        "quantity": item.quantity,
        "reorder_threshold": item.reorder_threshold,
        "low_stock": item.is_low_stock(),
        "deleted_at": item.deleted_at.map(|t| t.to_rfc3339()),
        "added_at": item.added_at.to_rfc3339(),
    })
}

/// Listing shape: the item plus who added it.
pub fn record_to_json(rec: &ItemRecord) -> serde_json::Value {
    let mut value = item_to_json(&rec.item);
    value["added_by"] = serde_json::Value::String(rec.added_by_username.clone());
    value
}

pub fn audit_to_json(entry: &AuditRecord) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id.to_string(),
        "action": entry.action,
        "performed_by": entry.performed_by_username,
        "timestamp": entry.timestamp.to_rfc3339(),
    })
}

/// One row of the flat cross-item moves feed.
pub fn feed_entry_to_json(history: &ItemHistory, entry: &AuditRecord) -> serde_json::Value {
    serde_json::json!({
        "item_id": history.item_id.to_string(),
        "item_name": history.name,
        "category": history.category,
        "action": entry.action,
        "performed_by": entry.performed_by_username,
        "timestamp": entry.timestamp.to_rfc3339(),
    })
}
