//! In-memory backend for development and tests.
//!
//! One mutex guards all state, so each operation — item write plus audit
//! append — is atomic and operations on the same item are fully serialized.
//! Nothing is cached across operations; every call re-reads current state
//! under the lock before validating and mutating.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_auth::User;
use stockroom_core::{DomainError, ItemId, UserId};
use stockroom_inventory::{
    plan_create, AuditEntry, CreateItem, CreatePlan, InventoryItem, StockMove, UpdateItem,
};

use crate::error::StoreError;
use crate::records::{AuditRecord, ItemHistory, ItemRecord};
use crate::store::{InventoryStore, ItemFilter, UserStore};

#[derive(Default)]
struct State {
    next_user_id: i64,
    users: Vec<User>,
    items: Vec<InventoryItem>,
    audits: Vec<AuditEntry>,
}

impl State {
    fn username_of(&self, id: UserId) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            // Tokens minted out-of-band may name a user this store never saw.
            .unwrap_or_else(|| id.to_string())
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut InventoryItem, StoreError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Audit entries for one item, newest first.
    fn entries_for(&self, id: ItemId) -> Vec<AuditRecord> {
        self.audits
            .iter()
            .filter(|a| a.item_id == id)
            .rev()
            .map(|a| AuditRecord {
                id: a.id,
                action: a.action.clone(),
                performed_by: a.performed_by,
                performed_by_username: self.username_of(a.performed_by),
                timestamp: a.timestamp,
            })
            .collect()
    }
}

/// Mutex-backed store implementing both repository traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_item(
        &self,
        request: CreateItem,
        actor: UserId,
    ) -> Result<(InventoryItem, bool), StoreError> {
        let mut state = self.inner.lock().unwrap();
        let now = Utc::now();

        let existing = state
            .items
            .iter()
            .find(|i| !i.is_deleted && i.matches_catalog_key(&request.name, &request.category))
            .cloned();

        match plan_create(existing.as_ref(), &request)? {
            CreatePlan::Merge {
                item_id,
                new_quantity,
                action,
            } => {
                state.audits.push(AuditEntry::record(item_id, &action, actor, now));
                let item = state.item_mut(item_id)?;
                item.quantity = new_quantity;
                let item = item.clone();
                Ok((item, true))
            }
            CreatePlan::Insert { action } => {
                let item = InventoryItem {
                    id: ItemId::new(),
                    name: request.name,
                    category: request.category,
                    quantity: request.quantity,
                    reorder_threshold: request.reorder_threshold,
                    is_deleted: false,
                    deleted_at: None,
                    added_by: actor,
                    added_at: now,
                };
                state
                    .audits
                    .push(AuditEntry::record(item.id, &action, actor, now));
                state.items.push(item.clone());
                Ok((item, false))
            }
        }
    }

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemRecord>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|i| match filter {
                ItemFilter::Active => !i.is_deleted,
                ItemFilter::Deleted => i.is_deleted,
                ItemFilter::All => true,
            })
            .map(|i| ItemRecord {
                item: i.clone(),
                added_by_username: state.username_of(i.added_by),
            })
            .collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state.items.iter().find(|i| i.id == id).cloned())
    }

    async fn update_item(
        &self,
        id: ItemId,
        update: UpdateItem,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let mut state = self.inner.lock().unwrap();
        let now = Utc::now();

        let item = state.item_mut(id)?;
        let action = item.apply_update(&update)?;
        let updated = item.clone();
        state.audits.push(AuditEntry::record(id, &action, actor, now));
        Ok(updated)
    }

    async fn soft_delete_item(&self, id: ItemId, actor: UserId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        let now = Utc::now();

        let item = state.item_mut(id)?;
        let action = item.soft_delete(now)?;
        state.audits.push(AuditEntry::record(id, &action, actor, now));
        Ok(())
    }

    async fn restore_item(
        &self,
        id: ItemId,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let mut state = self.inner.lock().unwrap();
        let now = Utc::now();

        let item = state.item_mut(id)?;
        let action = item.restore()?;
        let restored = item.clone();
        state.audits.push(AuditEntry::record(id, &action, actor, now));
        Ok(restored)
    }

    async fn purge_item(&self, id: ItemId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();

        let idx = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(DomainError::NotFound)?;

        // Cascade: entries are lifetime-bound to their item for purge.
        state.audits.retain(|a| a.item_id != id);
        state.items.remove(idx);
        Ok(())
    }

    async fn move_stock(
        &self,
        id: ItemId,
        mv: StockMove,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let mut state = self.inner.lock().unwrap();
        let now = Utc::now();

        let item = state.item_mut(id)?;
        let action = item.move_stock(&mv)?;
        let moved = item.clone();
        state.audits.push(AuditEntry::record(id, &action, actor, now));
        Ok(moved)
    }

    async fn audit_for_item(
        &self,
        id: ItemId,
    ) -> Result<(InventoryItem, Vec<AuditRecord>), StoreError> {
        let state = self.inner.lock().unwrap();
        let item = state
            .items
            .iter()
            .find(|i| i.id == id && !i.is_deleted)
            .cloned()
            .ok_or(DomainError::NotFound)?;
        let entries = state.entries_for(id);
        Ok((item, entries))
    }

    async fn audit_all(&self) -> Result<Vec<ItemHistory>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|i| !i.is_deleted)
            .map(|i| ItemHistory {
                item_id: i.id,
                name: i.name.clone(),
                category: i.category.clone(),
                quantity: i.quantity,
                entries: state.entries_for(i.id),
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut state = self.inner.lock().unwrap();
        if state.users.iter().any(|u| u.username == username) {
            return Err(DomainError::conflict("username already taken").into());
        }

        state.next_user_id += 1;
        let user = User {
            id: UserId::new(state.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }
}
