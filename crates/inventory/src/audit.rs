//! Audit-action taxonomy and audit entries.
//!
//! Every mutating inventory operation produces exactly one [`AuditEntry`] in
//! the same atomic unit as the item write. Entries are immutable once
//! recorded and are only ever removed together with their item by an
//! explicit purge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AuditEntryId, ItemId, UserId};

/// Closed taxonomy of auditable actions.
///
/// The `Display` rendering is the canonical wire/storage form, e.g.
/// `"Added"`, `"Added (merged) +5"`, `"Out 5 (damaged)"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// A brand-new item was inserted.
    Added,
    /// A creation request matched an existing active item and was merged
    /// into it as a quantity increment.
    AddedMerged { amount: i64 },
    /// Mutable fields were overwritten.
    Updated,
    /// The item was soft-deleted.
    Deleted,
    /// A soft-deleted item was restored.
    Restored,
    /// Stock moved in (quantity increased by `amount`).
    In { amount: i64, reason: Option<String> },
    /// Stock moved out (quantity decreased by `amount`).
    Out { amount: i64, reason: Option<String> },
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuditAction::Added => write!(f, "Added"),
            AuditAction::AddedMerged { amount } => write!(f, "Added (merged) +{amount}"),
            AuditAction::Updated => write!(f, "Updated"),
            AuditAction::Deleted => write!(f, "Deleted"),
            AuditAction::Restored => write!(f, "Restored"),
            AuditAction::In { amount, reason } => {
                write!(f, "In {amount}")?;
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            }
            AuditAction::Out { amount, reason } => {
                write!(f, "Out {amount}")?;
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            }
        }
    }
}

/// One immutable record of one action taken against one inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub item_id: ItemId,
    /// Canonical rendering of the [`AuditAction`] that produced this entry.
    pub action: String,
    pub performed_by: UserId,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Record an action against an item.
    pub fn record(
        item_id: ItemId,
        action: &AuditAction,
        performed_by: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            item_id,
            action: action.to_string(),
            performed_by,
            timestamp,
        }
    }
}
