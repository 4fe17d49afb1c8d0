// src/resource/store.rs
// Resource Store (C2) — typed upsert/fetch/soft-delete/restore/purge
// primitives over conversations, messages, blocks, providers. Every fetch
// filters `WHERE id = ? AND user_id = ?`; callers map a missing row to
// `NotFound`, never `Forbidden` (spec §4.2).

use sqlx::{Row, SqlitePool};

use crate::error::{CoreError, CoreResult};
use crate::resource::models::{Conversation, MessageBlock, Provider, SyncMessage};

pub struct ResourceStore {
    pool: SqlitePool,
}

impl ResourceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Conversations
    // =========================================================================

    pub async fn get_conversation(&self, user_id: i64, id: &str) -> CoreResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Conversation::from_row(&r)))
    }

    pub async fn require_conversation(&self, user_id: i64, id: &str) -> CoreResult<Conversation> {
        self.get_conversation(user_id, id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_conversation(
        &self,
        user_id: i64,
        c: &Conversation,
        ts: i64,
    ) -> CoreResult<bool> {
        let existing = self.get_conversation(user_id, &c.id).await?;
        let created = existing.is_none();

        if let Some(existing) = existing {
            sqlx::query(
                "UPDATE conversations SET
                    title = ?, display_name = ?, avatar_url = ?, character_image_url = ?,
                    self_address = ?, address_user = ?, voice_file_url = ?, persona_prompt = ?,
                    default_provider_id = ?, session_provider_id = ?,
                    is_pinned = ?, is_favorite = ?, is_muted = ?, sound_enabled = ?,
                    last_message = ?, last_message_time = ?, unread_count = ?,
                    updated_at = ?
                 WHERE id = ? AND user_id = ?",
            )
            .bind(&c.title)
            .bind(&c.display_name)
            .bind(&c.avatar_url)
            .bind(&c.character_image_url)
            .bind(&c.self_address)
            .bind(&c.address_user)
            .bind(&c.voice_file_url)
            .bind(&c.persona_prompt)
            .bind(&c.default_provider_id)
            .bind(&c.session_provider_id)
            .bind(c.is_pinned as i64)
            .bind(c.is_favorite as i64)
            .bind(c.is_muted as i64)
            .bind(c.sound_enabled as i64)
            .bind(&c.last_message)
            .bind(c.last_message_time)
            .bind(c.unread_count)
            .bind(ts)
            .bind(&c.id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
            let _ = existing;
        } else {
            sqlx::query(
                "INSERT INTO conversations (
                    id, user_id, title, display_name, avatar_url, character_image_url,
                    self_address, address_user, voice_file_url, persona_prompt,
                    default_provider_id, session_provider_id,
                    is_pinned, is_favorite, is_muted, sound_enabled,
                    last_message, last_message_time, unread_count,
                    parent_conversation_id, fork_from_message_id, conflict_of,
                    deleted_at, purge_at, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&c.id)
            .bind(user_id)
            .bind(&c.title)
            .bind(&c.display_name)
            .bind(&c.avatar_url)
            .bind(&c.character_image_url)
            .bind(&c.self_address)
            .bind(&c.address_user)
            .bind(&c.voice_file_url)
            .bind(&c.persona_prompt)
            .bind(&c.default_provider_id)
            .bind(&c.session_provider_id)
            .bind(c.is_pinned as i64)
            .bind(c.is_favorite as i64)
            .bind(c.is_muted as i64)
            .bind(c.sound_enabled as i64)
            .bind(&c.last_message)
            .bind(c.last_message_time)
            .bind(c.unread_count)
            .bind(&c.parent_conversation_id)
            .bind(&c.fork_from_message_id)
            .bind(&c.conflict_of)
            .bind(c.deleted_at)
            .bind(c.purge_at)
            .bind(ts)
            .bind(ts)
            .execute(&self.pool)
            .await?;
        }

        Ok(created)
    }

    pub async fn touch_conversation_preview(
        &self,
        user_id: i64,
        id: &str,
        last_message: &str,
        ts: i64,
    ) -> CoreResult<()> {
        sqlx::query(
            "UPDATE conversations SET last_message = ?, last_message_time = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(last_message)
        .bind(ts)
        .bind(ts)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn soft_delete_conversation(
        &self,
        user_id: i64,
        id: &str,
        ts: i64,
        purge_at: i64,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE conversations SET deleted_at = ?, purge_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(ts)
        .bind(purge_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::NotFound);
        }

        sqlx::query(
            "UPDATE sync_messages SET deleted_at = ?, purge_at = ?
             WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(ts)
        .bind(purge_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn restore_conversation(&self, user_id: i64, id: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE conversations SET deleted_at = NULL, purge_at = NULL
             WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::NotFound);
        }

        sqlx::query(
            "UPDATE sync_messages SET deleted_at = NULL, purge_at = NULL
             WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn conversations_changed_since(
        &self,
        user_id: i64,
        since: i64,
        limit: i64,
    ) -> CoreResult<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE user_id = ? AND updated_at > ?
             ORDER BY updated_at ASC LIMIT ?",
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Conversation::from_row).collect())
    }

    pub async fn conversations_in_recycle_bin(
        &self,
        user_id: i64,
        now: i64,
    ) -> CoreResult<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT * FROM conversations
             WHERE user_id = ? AND deleted_at IS NOT NULL AND purge_at > ?
             ORDER BY updated_at ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Conversation::from_row).collect())
    }

    /// Fork (spec §4.5, §1 "the conversation fork transaction"): insert the
    /// new conversation, every copied message and its blocks, and the
    /// resulting preview touch, all in one transaction.
    pub async fn fork_conversation(
        &self,
        user_id: i64,
        ts: i64,
        child: &Conversation,
        message_copies: &[(SyncMessage, Vec<MessageBlock>)],
        preview: Option<(String, i64)>,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO conversations (
                id, user_id, title, display_name, avatar_url, character_image_url,
                self_address, address_user, voice_file_url, persona_prompt,
                default_provider_id, session_provider_id,
                is_pinned, is_favorite, is_muted, sound_enabled,
                last_message, last_message_time, unread_count,
                parent_conversation_id, fork_from_message_id, conflict_of,
                deleted_at, purge_at, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&child.id)
        .bind(user_id)
        .bind(&child.title)
        .bind(&child.display_name)
        .bind(&child.avatar_url)
        .bind(&child.character_image_url)
        .bind(&child.self_address)
        .bind(&child.address_user)
        .bind(&child.voice_file_url)
        .bind(&child.persona_prompt)
        .bind(&child.default_provider_id)
        .bind(&child.session_provider_id)
        .bind(child.is_pinned as i64)
        .bind(child.is_favorite as i64)
        .bind(child.is_muted as i64)
        .bind(child.sound_enabled as i64)
        .bind(&child.last_message)
        .bind(child.last_message_time)
        .bind(child.unread_count)
        .bind(&child.parent_conversation_id)
        .bind(&child.fork_from_message_id)
        .bind(&child.conflict_of)
        .bind(child.deleted_at)
        .bind(child.purge_at)
        .bind(ts)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        for (m, blocks) in message_copies {
            sqlx::query(
                "INSERT INTO sync_messages (
                    id, conversation_id, user_id, role, content, status,
                    replaced_by, conflict_of, deleted_at, purge_at, created_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&m.id)
            .bind(&m.conversation_id)
            .bind(user_id)
            .bind(&m.role)
            .bind(&m.content)
            .bind(&m.status)
            .bind(&m.replaced_by)
            .bind(&m.conflict_of)
            .bind(m.deleted_at)
            .bind(m.purge_at)
            .bind(m.created_at)
            .execute(&mut *tx)
            .await?;

            for b in blocks {
                let data_json =
                    serde_json::to_string(&b.data).map_err(|e| CoreError::invalid(e.to_string()))?;
                sqlx::query(
                    "INSERT INTO message_blocks (id, message_id, type, status, data, sort_order)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&b.id)
                .bind(&b.message_id)
                .bind(&b.block_type)
                .bind(&b.status)
                .bind(data_json)
                .bind(b.sort_order)
                .execute(&mut *tx)
                .await?;
            }
        }

        if let Some((preview_text, at)) = preview {
            sqlx::query(
                "UPDATE conversations SET last_message = ?, last_message_time = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
            )
            .bind(preview_text)
            .bind(at)
            .bind(at)
            .bind(&child.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub async fn get_message(&self, user_id: i64, id: &str) -> CoreResult<Option<SyncMessage>> {
        let row = sqlx::query("SELECT * FROM sync_messages WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| SyncMessage::from_row(&r)))
    }

    pub async fn require_message(&self, user_id: i64, id: &str) -> CoreResult<SyncMessage> {
        self.get_message(user_id, id).await?.ok_or(CoreError::NotFound)
    }

    pub async fn insert_message(&self, user_id: i64, m: &SyncMessage) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO sync_messages (
                id, conversation_id, user_id, role, content, status,
                replaced_by, conflict_of, deleted_at, purge_at, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&m.id)
        .bind(&m.conversation_id)
        .bind(user_id)
        .bind(&m.role)
        .bind(&m.content)
        .bind(&m.status)
        .bind(&m.replaced_by)
        .bind(&m.conflict_of)
        .bind(m.deleted_at)
        .bind(m.purge_at)
        .bind(m.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Regenerate-replace (spec §4.5): soft-delete the old message, insert its
    /// successor with blocks, and touch the parent conversation's preview, all
    /// in one transaction so partial completion is impossible.
    #[allow(clippy::too_many_arguments)]
    pub async fn regen_message(
        &self,
        user_id: i64,
        old_id: &str,
        ts: i64,
        purge_at: i64,
        new_message: &SyncMessage,
        blocks: &[MessageBlock],
        conversation_id: &str,
        preview: &str,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sync_messages SET deleted_at = ?, purge_at = ?, replaced_by = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(ts)
        .bind(purge_at)
        .bind(&new_message.id)
        .bind(old_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::NotFound);
        }

        sqlx::query(
            "INSERT INTO sync_messages (
                id, conversation_id, user_id, role, content, status,
                replaced_by, conflict_of, deleted_at, purge_at, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_message.id)
        .bind(&new_message.conversation_id)
        .bind(user_id)
        .bind(&new_message.role)
        .bind(&new_message.content)
        .bind(&new_message.status)
        .bind(&new_message.replaced_by)
        .bind(&new_message.conflict_of)
        .bind(new_message.deleted_at)
        .bind(new_message.purge_at)
        .bind(new_message.created_at)
        .execute(&mut *tx)
        .await?;

        for b in blocks {
            let data_json = serde_json::to_string(&b.data).map_err(|e| CoreError::invalid(e.to_string()))?;
            sqlx::query(
                "INSERT INTO message_blocks (id, message_id, type, status, data, sort_order)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&b.id)
            .bind(&b.message_id)
            .bind(&b.block_type)
            .bind(&b.status)
            .bind(data_json)
            .bind(b.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE conversations SET last_message = ?, last_message_time = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(preview)
        .bind(ts)
        .bind(ts)
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn soft_delete_message(
        &self,
        user_id: i64,
        id: &str,
        ts: i64,
        purge_at: i64,
    ) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE sync_messages SET deleted_at = ?, purge_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(ts)
        .bind(purge_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    pub async fn restore_message(&self, user_id: i64, id: &str) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE sync_messages SET deleted_at = NULL, purge_at = NULL
             WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    pub async fn messages_for_conversation(
        &self,
        user_id: i64,
        conversation_id: &str,
    ) -> CoreResult<Vec<SyncMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_messages WHERE user_id = ? AND conversation_id = ?
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(SyncMessage::from_row).collect())
    }

    pub async fn messages_changed_since(
        &self,
        user_id: i64,
        since: i64,
        limit: i64,
    ) -> CoreResult<Vec<SyncMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_messages WHERE user_id = ? AND created_at > ?
             ORDER BY created_at ASC LIMIT ?",
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(SyncMessage::from_row).collect())
    }

    pub async fn messages_in_recycle_bin(
        &self,
        user_id: i64,
        now: i64,
    ) -> CoreResult<Vec<SyncMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_messages
             WHERE user_id = ? AND deleted_at IS NOT NULL AND purge_at > ?
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(SyncMessage::from_row).collect())
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    pub async fn insert_block(&self, b: &MessageBlock) -> CoreResult<()> {
        let data_json = serde_json::to_string(&b.data).map_err(|e| CoreError::invalid(e.to_string()))?;

        sqlx::query(
            "INSERT INTO message_blocks (id, message_id, type, status, data, sort_order)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&b.id)
        .bind(&b.message_id)
        .bind(&b.block_type)
        .bind(&b.status)
        .bind(data_json)
        .bind(b.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn blocks_for_message(&self, message_id: &str) -> CoreResult<Vec<MessageBlock>> {
        let rows = sqlx::query(
            "SELECT * FROM message_blocks WHERE message_id = ? ORDER BY sort_order ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(MessageBlock::from_row).collect())
    }

    pub async fn blocks_for_messages(
        &self,
        message_ids: &[String],
    ) -> CoreResult<std::collections::HashMap<String, Vec<MessageBlock>>> {
        let mut out: std::collections::HashMap<String, Vec<MessageBlock>> =
            std::collections::HashMap::new();

        for id in message_ids {
            let blocks = self.blocks_for_message(id).await?;
            out.insert(id.clone(), blocks);
        }

        Ok(out)
    }

    // =========================================================================
    // Providers
    // =========================================================================

    pub async fn get_provider(&self, user_id: i64, id: &str) -> CoreResult<Option<Provider>> {
        let row = sqlx::query("SELECT * FROM providers WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Provider::from_row(&r)))
    }

    pub async fn require_provider(&self, user_id: i64, id: &str) -> CoreResult<Provider> {
        self.get_provider(user_id, id).await?.ok_or(CoreError::NotFound)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_provider(
        &self,
        user_id: i64,
        p: &Provider,
        ts: i64,
        reseal_credentials: bool,
    ) -> CoreResult<bool> {
        let existing = self.get_provider(user_id, &p.id).await?;
        let created = existing.is_none();

        let capabilities = serde_json::to_string(&p.capabilities).map_err(|e| CoreError::invalid(e.to_string()))?;
        let custom_config = serde_json::to_string(&p.custom_config).map_err(|e| CoreError::invalid(e.to_string()))?;
        let visible_models = serde_json::to_string(&p.visible_models).map_err(|e| CoreError::invalid(e.to_string()))?;
        let hidden_models = serde_json::to_string(&p.hidden_models).map_err(|e| CoreError::invalid(e.to_string()))?;

        if let Some(existing) = existing {
            if reseal_credentials {
                sqlx::query(
                    "UPDATE providers SET
                        display_name = ?, api_base_url = ?, enabled = ?, capabilities = ?,
                        custom_config = ?, model_type = ?, visible_models = ?, hidden_models = ?,
                        api_keys_encrypted = ?, updated_at = ?
                     WHERE id = ? AND user_id = ?",
                )
                .bind(&p.display_name)
                .bind(&p.api_base_url)
                .bind(p.enabled as i64)
                .bind(&capabilities)
                .bind(&custom_config)
                .bind(&p.model_type)
                .bind(&visible_models)
                .bind(&hidden_models)
                .bind(&p.api_keys_encrypted)
                .bind(ts)
                .bind(&p.id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            } else {
                sqlx::query(
                    "UPDATE providers SET
                        display_name = ?, api_base_url = ?, enabled = ?, capabilities = ?,
                        custom_config = ?, model_type = ?, visible_models = ?, hidden_models = ?,
                        updated_at = ?
                     WHERE id = ? AND user_id = ?",
                )
                .bind(&p.display_name)
                .bind(&p.api_base_url)
                .bind(p.enabled as i64)
                .bind(&capabilities)
                .bind(&custom_config)
                .bind(&p.model_type)
                .bind(&visible_models)
                .bind(&hidden_models)
                .bind(ts)
                .bind(&p.id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            }
            let _ = existing;
        } else {
            sqlx::query(
                "INSERT INTO providers (
                    id, user_id, display_name, api_base_url, enabled, capabilities,
                    custom_config, model_type, visible_models, hidden_models,
                    api_keys_encrypted, conflict_of, deleted_at, purge_at, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&p.id)
            .bind(user_id)
            .bind(&p.display_name)
            .bind(&p.api_base_url)
            .bind(p.enabled as i64)
            .bind(&capabilities)
            .bind(&custom_config)
            .bind(&p.model_type)
            .bind(&visible_models)
            .bind(&hidden_models)
            .bind(&p.api_keys_encrypted)
            .bind(&p.conflict_of)
            .bind(p.deleted_at)
            .bind(p.purge_at)
            .bind(ts)
            .bind(ts)
            .execute(&self.pool)
            .await?;
        }

        Ok(created)
    }

    pub async fn soft_delete_provider(
        &self,
        user_id: i64,
        id: &str,
        ts: i64,
        purge_at: i64,
    ) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE providers SET deleted_at = ?, purge_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(ts)
        .bind(purge_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    pub async fn restore_provider(&self, user_id: i64, id: &str) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE providers SET deleted_at = NULL, purge_at = NULL WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    pub async fn providers_changed_since(
        &self,
        user_id: i64,
        since: i64,
        limit: i64,
    ) -> CoreResult<Vec<Provider>> {
        let rows = sqlx::query(
            "SELECT * FROM providers WHERE user_id = ? AND updated_at > ?
             ORDER BY updated_at ASC LIMIT ?",
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Provider::from_row).collect())
    }

    pub async fn providers_in_recycle_bin(&self, user_id: i64, now: i64) -> CoreResult<Vec<Provider>> {
        let rows = sqlx::query(
            "SELECT * FROM providers
             WHERE user_id = ? AND deleted_at IS NOT NULL AND purge_at > ?
             ORDER BY updated_at ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Provider::from_row).collect())
    }

    // =========================================================================
    // Reaper (C6) — global, not scoped to a single user
    // =========================================================================

    pub async fn purge_expired_conversations(&self, now: i64) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM conversations WHERE purge_at IS NOT NULL AND purge_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired_messages(&self, now: i64) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM sync_messages WHERE purge_at IS NOT NULL AND purge_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired_providers(&self, now: i64) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM providers WHERE purge_at IS NOT NULL AND purge_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_orphaned_blocks(&self) -> CoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM message_blocks WHERE message_id NOT IN (SELECT id FROM sync_messages)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_stale_operations(&self, cutoff: i64) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM sync_operations WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
