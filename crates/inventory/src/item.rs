//! The inventory item and its lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId, UserId};

use crate::audit::AuditAction;
use crate::ops::{StockMove, UpdateItem};

/// An inventory item.
///
/// # Invariants
/// - `quantity >= 0` at all times; [`InventoryItem::move_stock`] is the sole
///   enforcement point for outbound moves.
/// - `added_by`/`added_at` are set once at creation and never mutated.
/// - While `is_deleted` is true the item is excluded from active listings
///   but remains addressable by id for restore/purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reorder_threshold: Option<i64>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Data contract for low-stock signalling: `quantity < reorder_threshold`.
    /// Presentation decides what to do with it; the item only exposes the
    /// comparison.
    pub fn is_low_stock(&self) -> bool {
        match self.reorder_threshold {
            Some(threshold) => self.quantity < threshold,
            None => false,
        }
    }

    /// Trimmed, case-insensitive match on `(name, category)` — the dedup key
    /// used by the merge-on-insert policy.
    pub fn matches_catalog_key(&self, name: &str, category: &str) -> bool {
        fn key(s: &str) -> String {
            s.trim().to_lowercase()
        }
        key(&self.name) == key(name) && key(&self.category) == key(category)
    }

    /// Overwrite all mutable fields.
    ///
    /// Soft-deleted items are treated as absent for updates.
    pub fn apply_update(&mut self, update: &UpdateItem) -> DomainResult<AuditAction> {
        if self.is_deleted {
            return Err(DomainError::not_found());
        }
        self.name = update.name.clone();
        self.category = update.category.clone();
        self.quantity = update.quantity;
        self.reorder_threshold = update.reorder_threshold;
        Ok(AuditAction::Updated)
    }

    /// Mark the item deleted without touching its quantity.
    ///
    /// An already-deleted item is treated as absent, so replaying a delete
    /// cannot append a second `"Deleted"` entry.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) -> DomainResult<AuditAction> {
        if self.is_deleted {
            return Err(DomainError::not_found());
        }
        self.is_deleted = true;
        self.deleted_at = Some(at);
        Ok(AuditAction::Deleted)
    }

    /// Bring a soft-deleted item back into active listings.
    pub fn restore(&mut self) -> DomainResult<AuditAction> {
        if !self.is_deleted {
            return Err(DomainError::conflict("item is not deleted"));
        }
        self.is_deleted = false;
        self.deleted_at = None;
        Ok(AuditAction::Restored)
    }

    /// Apply a validated stock move.
    ///
    /// `Out` beyond the current quantity is refused so `quantity >= 0` can
    /// never be violated here; `In` is checked against `i64` overflow.
    pub fn move_stock(&mut self, mv: &StockMove) -> DomainResult<AuditAction> {
        if self.is_deleted {
            return Err(DomainError::not_found());
        }

        match mv.direction {
            crate::ops::MoveDirection::Out => {
                if mv.amount > self.quantity {
                    return Err(DomainError::validation("not enough stock to remove"));
                }
                self.quantity -= mv.amount;
                Ok(AuditAction::Out {
                    amount: mv.amount,
                    reason: mv.reason.clone(),
                })
            }
            crate::ops::MoveDirection::In => {
                self.quantity = self
                    .quantity
                    .checked_add(mv.amount)
                    .ok_or_else(|| DomainError::validation("quantity overflow"))?;
                Ok(AuditAction::In {
                    amount: mv.amount,
                    reason: mv.reason.clone(),
                })
            }
        }
    }
}
