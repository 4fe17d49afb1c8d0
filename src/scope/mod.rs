// src/scope/mod.rs
// Scope Registry (C1) — spec §4.1. Whitelist of resource classes a user
// opts into syncing. Advisory only: it gates what Pull streams, never what
// Push accepts.

use sqlx::{Row, SqlitePool};

use crate::error::{CoreError, CoreResult};

pub const CHAT_HISTORY: &str = "chat.history";
pub const CHARACTERS_CARDS: &str = "characters.cards";
pub const CHARACTERS_PER_SETTINGS: &str = "characters.per_settings";
pub const PROVIDERS_CONFIG: &str = "providers.config";
pub const PROVIDERS_KEYS: &str = "providers.keys";
pub const USER_TEXT_INPUTS: &str = "user.text_inputs";

const VOCABULARY: &[&str] = &[
    CHAT_HISTORY,
    CHARACTERS_CARDS,
    CHARACTERS_PER_SETTINGS,
    PROVIDERS_CONFIG,
    PROVIDERS_KEYS,
    USER_TEXT_INPUTS,
];

fn default_scopes() -> Vec<String> {
    vec![CHAT_HISTORY.to_string(), CHARACTERS_CARDS.to_string()]
}

#[derive(Debug, Clone)]
pub struct ScopeSet {
    pub enabled_scopes: Vec<String>,
    pub updated_at: i64,
}

impl ScopeSet {
    pub fn has(&self, scope: &str) -> bool {
        self.enabled_scopes.iter().any(|s| s == scope)
    }
}

pub struct ScopeRegistry {
    pool: SqlitePool,
}

impl ScopeRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn validate(scopes: &[String]) -> CoreResult<()> {
        for s in scopes {
            if !VOCABULARY.contains(&s.as_str()) {
                return Err(CoreError::invalid(format!("unknown scope: {}", s)));
            }
        }
        Ok(())
    }

    pub async fn get_scopes(&self, user_id: i64, now: i64) -> CoreResult<ScopeSet> {
        let row = sqlx::query("SELECT enabled_scopes, updated_at FROM sync_scopes WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("enabled_scopes");
                let enabled_scopes = serde_json::from_str(&raw).unwrap_or_else(|_| default_scopes());
                Ok(ScopeSet {
                    enabled_scopes,
                    updated_at: row.get("updated_at"),
                })
            }
            None => Ok(ScopeSet {
                enabled_scopes: default_scopes(),
                updated_at: now,
            }),
        }
    }

    pub async fn put_scopes(
        &self,
        user_id: i64,
        scopes: Vec<String>,
        now: i64,
    ) -> CoreResult<ScopeSet> {
        Self::validate(&scopes)?;

        let json = serde_json::to_string(&scopes).map_err(|e| CoreError::invalid(e.to_string()))?;

        sqlx::query(
            "INSERT INTO sync_scopes (user_id, enabled_scopes, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET enabled_scopes = excluded.enabled_scopes,
             updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(&json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ScopeSet {
            enabled_scopes: scopes,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_schema_for_test(&pool).await;
        pool
    }

    #[tokio::test]
    async fn defaults_when_absent() {
        let registry = ScopeRegistry::new(test_pool().await);
        let scopes = registry.get_scopes(1, 1000).await.unwrap();
        assert_eq!(scopes.enabled_scopes, default_scopes());
    }

    #[tokio::test]
    async fn rejects_unknown_scope() {
        let registry = ScopeRegistry::new(test_pool().await);
        let err = registry
            .put_scopes(1, vec!["not.a.scope".to_string()], 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let registry = ScopeRegistry::new(test_pool().await);
        registry
            .put_scopes(1, vec![PROVIDERS_CONFIG.to_string()], 1000)
            .await
            .unwrap();

        let scopes = registry.get_scopes(1, 2000).await.unwrap();
        assert_eq!(scopes.enabled_scopes, vec![PROVIDERS_CONFIG.to_string()]);
        assert_eq!(scopes.updated_at, 1000);
    }
}
