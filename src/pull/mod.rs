// src/pull/mod.rs
// Pull Service (C3) — spec §4.3. Incremental change feed across
// conversations, messages, and providers, gated by the Scope Registry (C1).

use serde::Serialize;

use crate::crypto;
use crate::resource::{Conversation, Provider, ResourceStore, SyncMessage};
use crate::scope::{ScopeRegistry, CHARACTERS_CARDS, CHAT_HISTORY, PROVIDERS_CONFIG, PROVIDERS_KEYS};
use crate::error::CoreResult;

#[derive(Debug, Clone)]
pub struct PullCursors {
    pub conversations_since: i64,
    pub messages_since: i64,
    pub providers_since: i64,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub cursors: PullCursors,
    pub include_deleted: bool,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<SyncMessage>,
    pub providers: Vec<Provider>,
    pub server_time: i64,
}

pub struct PullService<'a> {
    store: &'a ResourceStore,
    scopes: &'a ScopeRegistry,
    kek_b64: &'a str,
}

impl<'a> PullService<'a> {
    pub fn new(store: &'a ResourceStore, scopes: &'a ScopeRegistry, kek_b64: &'a str) -> Self {
        Self { store, scopes, kek_b64 }
    }

    pub async fn pull(&self, user_id: i64, req: PullRequest, now: i64) -> CoreResult<PullResponse> {
        let scope_set = self.scopes.get_scopes(user_id, now).await?;

        let mut conversations = Vec::new();
        if scope_set.has(CHARACTERS_CARDS) || scope_set.has(CHAT_HISTORY) {
            conversations = self
                .store
                .conversations_changed_since(user_id, req.cursors.conversations_since, req.limit)
                .await?;
            if !req.include_deleted {
                conversations.retain(|c| c.deleted_at.is_none());
            }
        }

        let mut messages = Vec::new();
        if scope_set.has(CHAT_HISTORY) {
            messages = self
                .store
                .messages_changed_since(user_id, req.cursors.messages_since, req.limit)
                .await?;
            if !req.include_deleted {
                messages.retain(|m| m.deleted_at.is_none());
            }

            // Blocks have no independent soft-delete state; they cascade entirely
            // with their message, so every block of a surviving message is "non-deleted".
            let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
            let mut blocks_by_message = self.store.blocks_for_messages(&ids).await?;
            for m in messages.iter_mut() {
                m.blocks = blocks_by_message.remove(&m.id).unwrap_or_default();
            }
        }

        let mut providers = Vec::new();
        if scope_set.has(PROVIDERS_CONFIG) {
            providers = self
                .store
                .providers_changed_since(user_id, req.cursors.providers_since, req.limit)
                .await?;
            if !req.include_deleted {
                providers.retain(|p| p.deleted_at.is_none());
            }

            let include_keys = scope_set.has(PROVIDERS_KEYS);
            for p in providers.iter_mut() {
                if include_keys {
                    p.api_keys = Some(crypto::open_credentials(self.kek_b64, &p.api_keys_encrypted));
                } else {
                    p.api_keys = None;
                }
            }
        }

        Ok(PullResponse {
            conversations,
            messages,
            providers,
            server_time: now,
        })
    }
}
