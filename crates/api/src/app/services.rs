use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use stockroom_auth::Hs256JwtSigner;
use stockroom_infra::{InventoryStore, MemoryStore, PostgresStore, UserStore};

/// Wired application services shared by all handlers.
pub struct Services {
    pub inventory: Arc<dyn InventoryStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Hs256JwtSigner,
}

/// Select and connect the store backend.
///
/// `USE_PERSISTENT_STORES=1` (or `true`) switches to Postgres and requires
/// `DATABASE_URL`; anything else gets the in-memory backend, which is what
/// the black-box tests run against.
pub async fn build_services(jwt_secret: &str, token_ttl: Duration) -> anyhow::Result<Services> {
    let tokens = Hs256JwtSigner::new(jwt_secret.as_bytes(), token_ttl);

    if use_persistent_stores() {
        let url = std::env::var("DATABASE_URL")
            .context("USE_PERSISTENT_STORES is set but DATABASE_URL is not")?;
        let store = Arc::new(PostgresStore::connect(&url).await?);
        tracing::info!("using postgres-backed stores");
        Ok(Services {
            inventory: store.clone(),
            users: store,
            tokens,
        })
    } else {
        let store = Arc::new(MemoryStore::new());
        tracing::info!("using in-memory stores");
        Ok(Services {
            inventory: store.clone(),
            users: store,
            tokens,
        })
    }
}

fn use_persistent_stores() -> bool {
    std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
