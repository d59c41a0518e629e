//! Postgres schema bootstrap.
//!
//! The audits → items foreign key is declared `ON DELETE RESTRICT`: nothing
//! can remove an item out from under its audit trail except the explicit
//! purge path, which deletes both inside one transaction.

use sqlx::PgPool;

use crate::error::StoreError;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_items (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        category          TEXT NOT NULL,
        quantity          BIGINT NOT NULL CHECK (quantity >= 0),
        reorder_threshold BIGINT,
        is_deleted        BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_at        TIMESTAMPTZ,
        added_by          BIGINT NOT NULL REFERENCES users (id),
        added_at          TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_inventory_items_active_key
        ON inventory_items (lower(name), lower(category))
        WHERE NOT is_deleted
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_audits (
        id           UUID PRIMARY KEY,
        item_id      UUID NOT NULL REFERENCES inventory_items (id) ON DELETE RESTRICT,
        action       TEXT NOT NULL,
        performed_by BIGINT NOT NULL REFERENCES users (id),
        timestamp    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_inventory_audits_item
        ON inventory_audits (item_id, timestamp DESC)
    "#,
];

/// Create the schema if it does not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("schema ready");
    Ok(())
}
