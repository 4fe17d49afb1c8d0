// src/state.rs
// Shared application state handed to every axum handler.

use sqlx::SqlitePool;

use crate::config::SyncConfig;
use crate::locks::UserLocks;
use crate::resource::ResourceStore;
use crate::scope::ScopeRegistry;

pub struct AppState {
    pub config: SyncConfig,
    pub sqlite_pool: SqlitePool,
    pub resources: ResourceStore,
    pub scopes: ScopeRegistry,
    pub user_locks: UserLocks,
}

impl AppState {
    pub async fn new(config: SyncConfig) -> anyhow::Result<Self> {
        let pool = crate::db::connect(&config.database.url, config.database.max_connections).await?;

        Ok(Self {
            resources: ResourceStore::new(pool.clone()),
            scopes: ScopeRegistry::new(pool.clone()),
            sqlite_pool: pool,
            config,
            user_locks: UserLocks::new(),
        })
    }
}
