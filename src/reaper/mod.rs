// src/reaper/mod.rs
// Recycle-Bin Reaper (C6) — spec §4.6, plus the idempotency-table
// retention sweep called for in spec §9's open design note. Runs every
// hour from an in-process scheduler (see main.rs) and is also reachable
// through the secret-guarded `/purge-expired` admin endpoint.

use serde::Serialize;
use tracing::info;

use crate::resource::ResourceStore;
use crate::error::CoreResult;

#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct ReaperReport {
    pub conversations: u64,
    pub messages: u64,
    pub providers: u64,
    pub operations: u64,
}

/// Sweeps rows whose `purge_at` has passed. Ordering matters: conversations
/// first (their cascade already soft-deleted their messages at the same
/// timestamp, per invariant 6), then stray messages, then providers.
pub async fn sweep(store: &ResourceStore, now: i64, operation_retention_cutoff: i64) -> CoreResult<ReaperReport> {
    let conversations = store.purge_expired_conversations(now).await?;
    store.purge_orphaned_blocks().await?;
    let messages = store.purge_expired_messages(now).await?;
    let providers = store.purge_expired_providers(now).await?;
    let operations = store.purge_stale_operations(operation_retention_cutoff).await?;

    let report = ReaperReport {
        conversations,
        messages,
        providers,
        operations,
    };

    info!(
        conversations = report.conversations,
        messages = report.messages,
        providers = report.providers,
        operations = report.operations,
        "reaper swept expired rows"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_schema_for_test(&pool).await;
        pool
    }

    #[tokio::test]
    async fn purges_rows_past_purge_at() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO users (id) VALUES (1)").execute(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO conversations (id, user_id, deleted_at, purge_at, created_at, updated_at)
             VALUES ('c1', 1, 1000, 1500, 1000, 1000)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO sync_messages (id, conversation_id, user_id, role, content, status, deleted_at, purge_at, created_at)
             VALUES ('m1', 'c1', 1, 'user', 'hi', 'sent', 1000, 1500, 1000)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = ResourceStore::new(pool.clone());
        let report = sweep(&store, 2000, 0).await.unwrap();

        assert_eq!(report.conversations, 1);
        assert_eq!(report.messages, 1);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn leaves_rows_not_yet_expired() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO users (id) VALUES (1)").execute(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO conversations (id, user_id, deleted_at, purge_at, created_at, updated_at)
             VALUES ('c1', 1, 1000, 5000, 1000, 1000)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = ResourceStore::new(pool.clone());
        let report = sweep(&store, 2000, 0).await.unwrap();

        assert_eq!(report.conversations, 0);
    }
}
