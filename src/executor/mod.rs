// src/executor/mod.rs
// Operation Executor (C5) — spec §4.5. Implements the seven push verbs.
// Every verb stamps `ts` (chosen once by the push batch) into the relevant
// `created_at`/`updated_at` field and returns a small result object that
// replays verbatim on a duplicate `op_id`.

use serde_json::{json, Value};

use crate::crypto;
use crate::error::{CoreError, CoreResult};
use crate::push::types::{
    AppendMessageData, ForkData, RegenData, TargetData, UpsertConversationData,
    UpsertProviderData,
};
use crate::resource::{Conversation, MessageBlock, Provider, ResourceStore, SyncMessage};

pub struct Executor<'a> {
    store: &'a ResourceStore,
    kek_b64: &'a str,
    recycle_window_ms: i64,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a ResourceStore, kek_b64: &'a str, recycle_window_ms: i64) -> Self {
        Self {
            store,
            kek_b64,
            recycle_window_ms,
        }
    }

    pub async fn upsert_conversation(
        &self,
        user_id: i64,
        ts: i64,
        data: UpsertConversationData,
    ) -> CoreResult<Value> {
        let existing = self.store.get_conversation(user_id, &data.id).await?;

        let conversation = Conversation {
            id: data.id.clone(),
            user_id,
            title: data.title,
            display_name: data.display_name,
            avatar_url: data.avatar_url,
            character_image_url: data.character_image_url,
            self_address: data.self_address,
            address_user: data.address_user,
            voice_file_url: data.voice_file_url,
            persona_prompt: data.persona_prompt,
            default_provider_id: data.default_provider_id,
            session_provider_id: data.session_provider_id,
            is_pinned: data.is_pinned,
            is_favorite: data.is_favorite,
            is_muted: data.is_muted,
            sound_enabled: data.sound_enabled,
            last_message: existing.as_ref().and_then(|c| c.last_message.clone()),
            last_message_time: existing.as_ref().and_then(|c| c.last_message_time),
            unread_count: data.unread_count,
            // Fork parentage may only be set at creation; an upsert never touches it.
            parent_conversation_id: existing.as_ref().and_then(|c| c.parent_conversation_id.clone()),
            fork_from_message_id: existing.as_ref().and_then(|c| c.fork_from_message_id.clone()),
            conflict_of: existing.as_ref().and_then(|c| c.conflict_of.clone()),
            deleted_at: existing.as_ref().and_then(|c| c.deleted_at),
            purge_at: existing.as_ref().and_then(|c| c.purge_at),
            created_at: ts,
            updated_at: ts,
        };

        let created = self.store.upsert_conversation(user_id, &conversation, ts).await?;

        Ok(json!({
            "id": data.id,
            "action": if created { "created" } else { "updated" },
        }))
    }

    pub async fn append_message(
        &self,
        user_id: i64,
        ts: i64,
        data: AppendMessageData,
    ) -> CoreResult<Value> {
        self.store.require_conversation(user_id, &data.conversation_id).await?;

        let message = SyncMessage {
            id: data.id.clone(),
            conversation_id: data.conversation_id.clone(),
            user_id,
            role: data.role,
            content: data.content.clone(),
            status: data.status.unwrap_or_else(|| "sent".to_string()),
            replaced_by: None,
            conflict_of: None,
            deleted_at: None,
            purge_at: None,
            created_at: ts,
            blocks: Vec::new(),
        };

        self.store.insert_message(user_id, &message).await?;
        self.insert_blocks(&message.id, data.blocks).await?;

        let preview: String = data.content.chars().take(100).collect();
        self.store
            .touch_conversation_preview(user_id, &data.conversation_id, &preview, ts)
            .await?;

        Ok(json!({ "id": data.id, "action": "created" }))
    }

    pub async fn delete(&self, user_id: i64, ts: i64, data: TargetData) -> CoreResult<Value> {
        let purge_at = ts + self.recycle_window_ms;

        match data.target_type.as_str() {
            "conversation" => {
                self.store
                    .soft_delete_conversation(user_id, &data.id, ts, purge_at)
                    .await?
            }
            "message" => {
                self.store.soft_delete_message(user_id, &data.id, ts, purge_at).await?
            }
            "provider" => {
                self.store
                    .soft_delete_provider(user_id, &data.id, ts, purge_at)
                    .await?
            }
            other => return Err(CoreError::invalid(format!("unknown target type: {}", other))),
        }

        Ok(json!({
            "id": data.id,
            "type": data.target_type,
            "action": "deleted",
            "purge_at": purge_at,
        }))
    }

    pub async fn restore(&self, user_id: i64, data: TargetData) -> CoreResult<Value> {
        match data.target_type.as_str() {
            "conversation" => self.store.restore_conversation(user_id, &data.id).await?,
            "message" => self.store.restore_message(user_id, &data.id).await?,
            "provider" => self.store.restore_provider(user_id, &data.id).await?,
            other => return Err(CoreError::invalid(format!("unknown target type: {}", other))),
        }

        Ok(json!({ "id": data.id, "type": data.target_type, "action": "restored" }))
    }

    pub async fn regen(&self, user_id: i64, ts: i64, data: RegenData) -> CoreResult<Value> {
        let old = self.store.require_message(user_id, &data.old_message_id).await?;
        if old.role != "assistant" {
            return Err(CoreError::invalid("regen target must be an assistant message"));
        }

        let purge_at = ts + self.recycle_window_ms;
        let new_message = data.new_message;

        let replacement = SyncMessage {
            id: new_message.id.clone(),
            conversation_id: old.conversation_id.clone(),
            user_id,
            role: "assistant".to_string(),
            content: new_message.content.clone(),
            status: new_message.status.unwrap_or_else(|| "sent".to_string()),
            replaced_by: None,
            conflict_of: None,
            deleted_at: None,
            purge_at: None,
            created_at: ts,
            blocks: Vec::new(),
        };

        let blocks = self.prepare_blocks(&replacement.id, new_message.blocks);
        let preview: String = new_message.content.chars().take(100).collect();

        self.store
            .regen_message(
                user_id,
                &old.id,
                ts,
                purge_at,
                &replacement,
                &blocks,
                &old.conversation_id,
                &preview,
            )
            .await?;

        Ok(json!({
            "old_message_id": old.id,
            "new_message_id": replacement.id,
            "action": "replaced",
        }))
    }

    pub async fn fork(&self, user_id: i64, ts: i64, data: ForkData) -> CoreResult<Value> {
        let parent = self
            .store
            .require_conversation(user_id, &data.parent_conversation_id)
            .await?;
        let fork_point = self.store.require_message(user_id, &data.fork_from_message_id).await?;
        if fork_point.conversation_id != parent.id {
            return Err(CoreError::invalid("fork point does not belong to parent conversation"));
        }

        let child = Conversation {
            id: data.new_conversation_id.clone(),
            user_id,
            title: data.title.or_else(|| parent.title.clone()),
            display_name: parent.display_name.clone(),
            avatar_url: parent.avatar_url.clone(),
            character_image_url: parent.character_image_url.clone(),
            self_address: parent.self_address.clone(),
            address_user: parent.address_user.clone(),
            voice_file_url: parent.voice_file_url.clone(),
            persona_prompt: parent.persona_prompt.clone(),
            default_provider_id: parent.default_provider_id.clone(),
            session_provider_id: parent.session_provider_id.clone(),
            is_pinned: false,
            is_favorite: false,
            is_muted: parent.is_muted,
            sound_enabled: parent.sound_enabled,
            last_message: None,
            last_message_time: None,
            unread_count: 0,
            parent_conversation_id: Some(parent.id.clone()),
            fork_from_message_id: Some(fork_point.id.clone()),
            conflict_of: None,
            deleted_at: None,
            purge_at: None,
            created_at: ts,
            updated_at: ts,
        };

        let copy_messages = data.copy_messages.unwrap_or(true);
        let mut message_copies = Vec::new();
        let mut last_preview: Option<(String, i64)> = None;

        if copy_messages {
            let suffix = short_id(&child.id);
            let parent_messages = self.store.messages_for_conversation(user_id, &parent.id).await?;

            for m in parent_messages
                .into_iter()
                .filter(|m| m.deleted_at.is_none() && m.created_at <= fork_point.created_at)
            {
                let new_id = format!("{}_fork_{}", m.id, suffix);
                let blocks = self.store.blocks_for_message(&m.id).await?;

                let copy = SyncMessage {
                    id: new_id.clone(),
                    conversation_id: child.id.clone(),
                    user_id,
                    role: m.role.clone(),
                    content: m.content.clone(),
                    status: m.status.clone(),
                    replaced_by: None,
                    conflict_of: None,
                    deleted_at: None,
                    purge_at: None,
                    created_at: m.created_at,
                    blocks: Vec::new(),
                };

                let block_copies: Vec<MessageBlock> = blocks
                    .iter()
                    .map(|b| MessageBlock {
                        id: format!("{}_fork_{}", b.id, suffix),
                        message_id: new_id.clone(),
                        block_type: b.block_type.clone(),
                        status: b.status.clone(),
                        data: b.data.clone(),
                        sort_order: b.sort_order,
                    })
                    .collect();

                last_preview = Some((m.content.chars().take(100).collect(), m.created_at));
                message_copies.push((copy, block_copies));
            }
        }

        self.store
            .fork_conversation(user_id, ts, &child, &message_copies, last_preview)
            .await?;

        Ok(json!({
            "new_conversation_id": child.id,
            "parent_conversation_id": parent.id,
            "fork_from_message_id": fork_point.id,
            "action": "forked",
        }))
    }

    pub async fn upsert_provider(
        &self,
        user_id: i64,
        ts: i64,
        data: UpsertProviderData,
    ) -> CoreResult<Value> {
        let existing = self.store.get_provider(user_id, &data.id).await?;

        let (api_keys_encrypted, reseal) = match data.api_keys {
            Some(keys) => (
                crypto::seal_credentials(self.kek_b64, &keys)
                    .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?,
                true,
            ),
            None => (
                existing.as_ref().map(|p| p.api_keys_encrypted.clone()).unwrap_or_else(|| "[]".to_string()),
                false,
            ),
        };

        let provider = Provider {
            id: data.id.clone(),
            user_id,
            display_name: data.display_name,
            api_base_url: data.api_base_url,
            enabled: data.enabled,
            capabilities: data.capabilities.unwrap_or_default(),
            custom_config: data.custom_config.unwrap_or_else(|| json!({})),
            model_type: data.model_type,
            visible_models: data.visible_models.unwrap_or_default(),
            hidden_models: data.hidden_models.unwrap_or_default(),
            api_keys_encrypted,
            api_keys: None,
            conflict_of: existing.as_ref().and_then(|p| p.conflict_of.clone()),
            deleted_at: existing.as_ref().and_then(|p| p.deleted_at),
            purge_at: existing.as_ref().and_then(|p| p.purge_at),
            created_at: ts,
            updated_at: ts,
        };

        let created = self.store.upsert_provider(user_id, &provider, ts, reseal).await?;

        Ok(json!({
            "id": data.id,
            "action": if created { "created" } else { "updated" },
        }))
    }

    async fn insert_blocks(&self, message_id: &str, blocks: Option<Vec<crate::push::types::BlockInput>>) -> CoreResult<()> {
        for block in self.prepare_blocks(message_id, blocks) {
            self.store.insert_block(&block).await?;
        }
        Ok(())
    }

    fn prepare_blocks(
        &self,
        message_id: &str,
        blocks: Option<Vec<crate::push::types::BlockInput>>,
    ) -> Vec<MessageBlock> {
        let Some(blocks) = blocks else { return Vec::new() };

        blocks
            .into_iter()
            .enumerate()
            .map(|(idx, b)| MessageBlock {
                id: b.id,
                message_id: message_id.to_string(),
                block_type: b.block_type,
                status: b.status.unwrap_or_else(|| "success".to_string()),
                data: b.data,
                sort_order: b.sort_order.unwrap_or(idx as i64),
            })
            .collect()
    }
}

/// Deterministic short suffix used to derive fork-copy ids, per spec §4.5:
/// "`<old_id>_fork_<short(new_conv_id)>`".
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
