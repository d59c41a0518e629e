//! Validated operation inputs and the merge-on-insert decision.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId};

use crate::audit::AuditAction;
use crate::item::InventoryItem;

/// Validated input for `Create`.
///
/// `name`/`category` are stored trimmed; a created item cannot start empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItem {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reorder_threshold: Option<i64>,
}

impl CreateItem {
    pub fn validated(
        name: &str,
        category: &str,
        quantity: i64,
        reorder_threshold: Option<i64>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if category.is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if reorder_threshold.is_some_and(|t| t < 0) {
            return Err(DomainError::validation(
                "reorder threshold cannot be negative",
            ));
        }
        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            quantity,
            reorder_threshold,
        })
    }
}

/// Validated input for `Update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateItem {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reorder_threshold: Option<i64>,
}

impl UpdateItem {
    pub fn validated(
        name: &str,
        category: &str,
        quantity: i64,
        reorder_threshold: Option<i64>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if category.is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if reorder_threshold.is_some_and(|t| t < 0) {
            return Err(DomainError::validation(
                "reorder threshold cannot be negative",
            ));
        }
        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            quantity,
            reorder_threshold,
        })
    }
}

/// Direction of a stock move.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    In,
    Out,
}

impl core::fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MoveDirection::In => write!(f, "In"),
            MoveDirection::Out => write!(f, "Out"),
        }
    }
}

impl FromStr for MoveDirection {
    type Err = DomainError;

    /// The wire form is exactly `"In"` or `"Out"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(MoveDirection::In),
            "Out" => Ok(MoveDirection::Out),
            _ => Err(DomainError::validation(
                "direction must be either 'In' or 'Out'",
            )),
        }
    }
}

/// Validated input for `MoveStock`: `amount > 0`, reason trimmed
/// (empty-after-trim becomes no reason).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMove {
    pub direction: MoveDirection,
    pub amount: i64,
    pub reason: Option<String>,
}

impl StockMove {
    pub fn validated(
        direction: &str,
        amount: i64,
        reason: Option<&str>,
    ) -> DomainResult<Self> {
        let direction: MoveDirection = direction.parse()?;
        if amount <= 0 {
            return Err(DomainError::validation("amount must be greater than zero"));
        }
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        Ok(Self {
            direction,
            amount,
            reason,
        })
    }
}

/// Outcome of the lookup-then-merge-or-insert decision for `Create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePlan {
    /// No active item matched the catalog key: insert a new row.
    Insert { action: AuditAction },
    /// An active item matched: bump its quantity instead of inserting.
    Merge {
        item_id: ItemId,
        new_quantity: i64,
        action: AuditAction,
    },
}

/// Decide between merging into an existing active item and inserting a new
/// one.
///
/// The caller looks up the active item matching the request's catalog key
/// (trimmed, case-insensitive `(name, category)`) and passes it in; keeping
/// the decision here makes the dedup policy testable apart from storage.
pub fn plan_create(
    existing: Option<&InventoryItem>,
    request: &CreateItem,
) -> DomainResult<CreatePlan> {
    match existing {
        Some(item) => {
            debug_assert!(!item.is_deleted, "merge candidates must be active");
            let new_quantity = item
                .quantity
                .checked_add(request.quantity)
                .ok_or_else(|| DomainError::validation("quantity overflow"))?;
            Ok(CreatePlan::Merge {
                item_id: item.id,
                new_quantity,
                action: AuditAction::AddedMerged {
                    amount: request.quantity,
                },
            })
        }
        None => Ok(CreatePlan::Insert {
            action: AuditAction::Added,
        }),
    }
}
