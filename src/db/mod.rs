// src/db/mod.rs
// Connection pool setup and schema bootstrap. No external migration tool —
// tables are created with `CREATE TABLE IF NOT EXISTS` at startup, matching
// the teacher stack's in-process schema bootstrap (cli/session/store.rs).

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url: {}", database_url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to connect to sqlite database")?;

    init_schema(&pool).await?;
    info!("database schema ready");

    Ok(pool)
}

#[cfg(test)]
pub async fn init_schema_for_test(pool: &SqlitePool) {
    init_schema(pool).await.expect("schema init failed in test fixture");
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            membership_tier INTEGER NOT NULL DEFAULT 0,
            membership_expires_at INTEGER
        );

        CREATE TABLE IF NOT EXISTS sync_scopes (
            user_id INTEGER PRIMARY KEY,
            enabled_scopes TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT,
            display_name TEXT,
            avatar_url TEXT,
            character_image_url TEXT,
            self_address TEXT,
            address_user TEXT,
            voice_file_url TEXT,
            persona_prompt TEXT,
            default_provider_id TEXT,
            session_provider_id TEXT,
            is_pinned INTEGER NOT NULL DEFAULT 0,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            is_muted INTEGER NOT NULL DEFAULT 0,
            sound_enabled INTEGER NOT NULL DEFAULT 1,
            last_message TEXT,
            last_message_time INTEGER,
            unread_count INTEGER NOT NULL DEFAULT 0,
            parent_conversation_id TEXT,
            fork_from_message_id TEXT,
            conflict_of TEXT,
            deleted_at INTEGER,
            purge_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user_updated
            ON conversations(user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_conversations_purge_at
            ON conversations(purge_at);

        CREATE TABLE IF NOT EXISTS sync_messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL,
            replaced_by TEXT,
            conflict_of TEXT,
            deleted_at INTEGER,
            purge_at INTEGER,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user_conv_created
            ON sync_messages(user_id, conversation_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON sync_messages(conversation_id);
        CREATE INDEX IF NOT EXISTS idx_messages_purge_at
            ON sync_messages(purge_at);

        CREATE TABLE IF NOT EXISTS message_blocks (
            id TEXT PRIMARY KEY,
            message_id TEXT NOT NULL,
            type TEXT NOT NULL,
            status TEXT NOT NULL,
            data TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_blocks_message_sort
            ON message_blocks(message_id, sort_order);

        CREATE TABLE IF NOT EXISTS providers (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            display_name TEXT NOT NULL,
            api_base_url TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            capabilities TEXT NOT NULL DEFAULT '[]',
            custom_config TEXT NOT NULL DEFAULT '{}',
            model_type TEXT,
            visible_models TEXT NOT NULL DEFAULT '[]',
            hidden_models TEXT NOT NULL DEFAULT '[]',
            api_keys_encrypted TEXT NOT NULL DEFAULT '[]',
            conflict_of TEXT,
            deleted_at INTEGER,
            purge_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_providers_user_updated
            ON providers(user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_providers_purge_at
            ON providers(purge_at);

        CREATE TABLE IF NOT EXISTS sync_operations (
            op_id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            device_id TEXT,
            op_type TEXT NOT NULL,
            input_json TEXT NOT NULL,
            result_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_operations_created_at
            ON sync_operations(created_at);

        CREATE TABLE IF NOT EXISTS sync_cursors (
            user_id INTEGER NOT NULL,
            device_id TEXT NOT NULL,
            resource_class TEXT NOT NULL,
            cursor INTEGER NOT NULL,
            PRIMARY KEY (user_id, device_id, resource_class)
        );
        "#,
    )
    .execute(pool)
    .await
    .context("failed to initialize schema")?;

    Ok(())
}
