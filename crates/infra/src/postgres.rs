//! Postgres-backed store.
//!
//! Every mutating operation runs in one transaction: the touched item row is
//! re-read under `SELECT ... FOR UPDATE`, the domain rule is applied to that
//! fresh state, and the item write plus audit append commit together.
//! Conflicting writers to the same item queue on the row lock, so a lost
//! update can never take the quantity below zero.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_auth::User;
use stockroom_core::{AuditEntryId, DomainError, ItemId, UserId};
use stockroom_inventory::{
    plan_create, AuditEntry, CreateItem, CreatePlan, InventoryItem, StockMove, UpdateItem,
};

use crate::error::StoreError;
use crate::records::{AuditRecord, ItemHistory, ItemRecord};
use crate::schema;
use crate::store::{InventoryStore, ItemFilter, UserStore};

const ITEM_COLUMNS: &str =
    "id, name, category, quantity, reorder_threshold, is_deleted, deleted_at, added_by, added_at";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    category: String,
    quantity: i64,
    reorder_threshold: Option<i64>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    added_by: i64,
    added_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: ItemId::from_uuid(row.id),
            name: row.name,
            category: row.category,
            quantity: row.quantity,
            reorder_threshold: row.reorder_threshold,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            added_by: UserId::new(row.added_by),
            added_at: row.added_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRecordRow {
    #[sqlx(flatten)]
    item: ItemRow,
    added_by_username: String,
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: Uuid,
    item_id: Uuid,
    action: String,
    performed_by: i64,
    performed_by_username: String,
    timestamp: DateTime<Utc>,
}

impl From<AuditRow> for AuditRecord {
    fn from(row: AuditRow) -> Self {
        AuditRecord {
            id: AuditEntryId::from_uuid(row.id),
            action: row.action,
            performed_by: UserId::new(row.performed_by),
            performed_by_username: row.performed_by_username,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Postgres store implementing both repository traits.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        schema::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Load an item row under a row lock; the caller's transaction holds the
    /// lock until commit/rollback.
    async fn lock_item(
        tx: &mut Transaction<'_, Postgres>,
        id: ItemId,
    ) -> Result<InventoryItem, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(InventoryItem::from)
            .ok_or_else(|| DomainError::not_found().into())
    }

    async fn insert_audit(
        tx: &mut Transaction<'_, Postgres>,
        entry: &AuditEntry,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO inventory_audits (id, item_id, action, performed_by, timestamp) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id.as_uuid())
        .bind(entry.item_id.as_uuid())
        .bind(&entry.action)
        .bind(entry.performed_by.as_i64())
        .bind(entry.timestamp)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn write_item_fields(
        tx: &mut Transaction<'_, Postgres>,
        item: &InventoryItem,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE inventory_items \
             SET name = $2, category = $3, quantity = $4, reorder_threshold = $5, \
                 is_deleted = $6, deleted_at = $7 \
             WHERE id = $1",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(item.reorder_threshold)
        .bind(item.is_deleted)
        .bind(item.deleted_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Audit entries for the given items, grouped by item, newest first.
    async fn entries_by_item(
        &self,
        item_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<AuditRecord>>, StoreError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT a.id, a.item_id, a.action, a.performed_by, \
                    u.username AS performed_by_username, a.timestamp \
             FROM inventory_audits a \
             JOIN users u ON u.id = a.performed_by \
             WHERE a.item_id = ANY($1) \
             ORDER BY a.timestamp DESC, a.id DESC",
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<AuditRecord>> = HashMap::new();
        for row in rows {
            grouped.entry(row.item_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create_item(
        &self,
        request: CreateItem,
        actor: UserId,
    ) -> Result<(InventoryItem, bool), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock the merge candidate (if any) so the merged quantity is
        // computed against committed state, not a row mid-update. Two
        // first-time creates of the same key see no candidate and can
        // still both insert.
        let existing = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE NOT is_deleted \
               AND lower(name) = lower($1) AND lower(category) = lower($2) \
             LIMIT 1 \
             FOR UPDATE"
        ))
        .bind(&request.name)
        .bind(&request.category)
        .fetch_optional(&mut *tx)
        .await?
        .map(InventoryItem::from);

        let (item, merged) = match plan_create(existing.as_ref(), &request)? {
            CreatePlan::Merge {
                item_id,
                new_quantity,
                action,
            } => {
                sqlx::query("UPDATE inventory_items SET quantity = $2 WHERE id = $1")
                    .bind(item_id.as_uuid())
                    .bind(new_quantity)
                    .execute(&mut *tx)
                    .await?;
                Self::insert_audit(&mut tx, &AuditEntry::record(item_id, &action, actor, now))
                    .await?;

                let mut item = existing.unwrap_or_else(|| unreachable!("merge without candidate"));
                item.quantity = new_quantity;
                (item, true)
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
                sqlx::query(
                    "INSERT INTO inventory_items \
                     (id, name, category, quantity, reorder_threshold, is_deleted, added_by, added_at) \
                     VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7)",
                )
                .bind(item.id.as_uuid())
                .bind(&item.name)
                .bind(&item.category)
                .bind(item.quantity)
                .bind(item.reorder_threshold)
                .bind(actor.as_i64())
                .bind(item.added_at)
                .execute(&mut *tx)
                .await?;
                Self::insert_audit(&mut tx, &AuditEntry::record(item.id, &action, actor, now))
                    .await?;
                (item, false)
            }
        };

        tx.commit().await?;
        Ok((item, merged))
    }

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemRecord>, StoreError> {
        let predicate = match filter {
            ItemFilter::Active => "WHERE NOT i.is_deleted",
            ItemFilter::Deleted => "WHERE i.is_deleted",
            ItemFilter::All => "",
        };
        let rows = sqlx::query_as::<_, ItemRecordRow>(&format!(
            "SELECT i.id, i.name, i.category, i.quantity, i.reorder_threshold, \
                    i.is_deleted, i.deleted_at, i.added_by, i.added_at, \
                    u.username AS added_by_username \
             FROM inventory_items i \
             JOIN users u ON u.id = i.added_by \
             {predicate} \
             ORDER BY i.added_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ItemRecord {
                item: row.item.into(),
                added_by_username: row.added_by_username,
            })
            .collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(InventoryItem::from))
    }

    #[instrument(skip(self, update), err)]
    async fn update_item(
        &self,
        id: ItemId,
        update: UpdateItem,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = Self::lock_item(&mut tx, id).await?;
        let action = item.apply_update(&update)?;
        Self::write_item_fields(&mut tx, &item).await?;
        Self::insert_audit(&mut tx, &AuditEntry::record(id, &action, actor, now)).await?;

        tx.commit().await?;
        Ok(item)
    }

    #[instrument(skip(self), err)]
    async fn soft_delete_item(&self, id: ItemId, actor: UserId) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = Self::lock_item(&mut tx, id).await?;
        let action = item.soft_delete(now)?;
        Self::write_item_fields(&mut tx, &item).await?;
        Self::insert_audit(&mut tx, &AuditEntry::record(id, &action, actor, now)).await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn restore_item(
        &self,
        id: ItemId,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = Self::lock_item(&mut tx, id).await?;
        let action = item.restore()?;
        Self::write_item_fields(&mut tx, &item).await?;
        Self::insert_audit(&mut tx, &AuditEntry::record(id, &action, actor, now)).await?;

        tx.commit().await?;
        Ok(item)
    }

    #[instrument(skip(self), err)]
    async fn purge_item(&self, id: ItemId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Cascade by hand: the RESTRICT foreign key makes this transaction
        // the only way an item can leave with its audit trail.
        sqlx::query("DELETE FROM inventory_audits WHERE item_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::not_found().into());
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, mv), fields(direction = %mv.direction, amount = mv.amount), err)]
    async fn move_stock(
        &self,
        id: ItemId,
        mv: StockMove,
        actor: UserId,
    ) -> Result<InventoryItem, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut item = Self::lock_item(&mut tx, id).await?;
        let action = item.move_stock(&mv)?;
        Self::write_item_fields(&mut tx, &item).await?;
        Self::insert_audit(&mut tx, &AuditEntry::record(id, &action, actor, now)).await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn audit_for_item(
        &self,
        id: ItemId,
    ) -> Result<(InventoryItem, Vec<AuditRecord>), StoreError> {
        let item = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(InventoryItem::from)
        .ok_or(DomainError::NotFound)?;

        let mut grouped = self.entries_by_item(&[*id.as_uuid()]).await?;
        let entries = grouped.remove(id.as_uuid()).unwrap_or_default();
        Ok((item, entries))
    }

    async fn audit_all(&self) -> Result<Vec<ItemHistory>, StoreError> {
        let items = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE NOT is_deleted ORDER BY added_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let mut grouped = self.entries_by_item(&ids).await?;

        Ok(items
            .into_iter()
            .map(|row| ItemHistory {
                item_id: ItemId::from_uuid(row.id),
                name: row.name,
                category: row.category,
                quantity: row.quantity,
                entries: grouped.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, password_hash), err)]
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DomainError::conflict("username already taken").into()
            }
            _ => StoreError::from(e),
        })?;
        Ok(row.into())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}
