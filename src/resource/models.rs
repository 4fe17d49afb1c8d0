// src/resource/models.rs
// Wire/row shapes for the four mutable resource kinds (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub character_image_url: Option<String>,
    pub self_address: Option<String>,
    pub address_user: Option<String>,
    pub voice_file_url: Option<String>,
    pub persona_prompt: Option<String>,
    pub default_provider_id: Option<String>,
    pub session_provider_id: Option<String>,
    pub is_pinned: bool,
    pub is_favorite: bool,
    pub is_muted: bool,
    pub sound_enabled: bool,
    pub last_message: Option<String>,
    pub last_message_time: Option<i64>,
    pub unread_count: i64,
    pub parent_conversation_id: Option<String>,
    pub fork_from_message_id: Option<String>,
    pub conflict_of: Option<String>,
    pub deleted_at: Option<i64>,
    pub purge_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            character_image_url: row.get("character_image_url"),
            self_address: row.get("self_address"),
            address_user: row.get("address_user"),
            voice_file_url: row.get("voice_file_url"),
            persona_prompt: row.get("persona_prompt"),
            default_provider_id: row.get("default_provider_id"),
            session_provider_id: row.get("session_provider_id"),
            is_pinned: row.get::<i64, _>("is_pinned") != 0,
            is_favorite: row.get::<i64, _>("is_favorite") != 0,
            is_muted: row.get::<i64, _>("is_muted") != 0,
            sound_enabled: row.get::<i64, _>("sound_enabled") != 0,
            last_message: row.get("last_message"),
            last_message_time: row.get("last_message_time"),
            unread_count: row.get("unread_count"),
            parent_conversation_id: row.get("parent_conversation_id"),
            fork_from_message_id: row.get("fork_from_message_id"),
            conflict_of: row.get("conflict_of"),
            deleted_at: row.get("deleted_at"),
            purge_at: row.get("purge_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBlock {
    pub id: String,
    #[serde(skip_serializing)]
    pub message_id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub status: String,
    pub data: Value,
    pub sort_order: i64,
}

impl MessageBlock {
    pub fn from_row(row: &SqliteRow) -> Self {
        let raw: String = row.get("data");
        Self {
            id: row.get("id"),
            message_id: row.get("message_id"),
            block_type: row.get("type"),
            status: row.get("status"),
            data: serde_json::from_str(&raw).unwrap_or(Value::Null),
            sort_order: row.get("sort_order"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMessage {
    pub id: String,
    pub conversation_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub role: String,
    pub content: String,
    pub status: String,
    pub replaced_by: Option<String>,
    pub conflict_of: Option<String>,
    pub deleted_at: Option<i64>,
    pub purge_at: Option<i64>,
    pub created_at: i64,
    #[serde(default)]
    pub blocks: Vec<MessageBlock>,
}

impl SyncMessage {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            user_id: row.get("user_id"),
            role: row.get("role"),
            content: row.get("content"),
            status: row.get("status"),
            replaced_by: row.get("replaced_by"),
            conflict_of: row.get("conflict_of"),
            deleted_at: row.get("deleted_at"),
            purge_at: row.get("purge_at"),
            created_at: row.get("created_at"),
            blocks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub display_name: String,
    pub api_base_url: String,
    pub enabled: bool,
    pub capabilities: Vec<String>,
    pub custom_config: Value,
    pub model_type: Option<String>,
    pub visible_models: Vec<String>,
    pub hidden_models: Vec<String>,
    #[serde(skip)]
    pub api_keys_encrypted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<Vec<String>>,
    pub conflict_of: Option<String>,
    pub deleted_at: Option<i64>,
    pub purge_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Provider {
    pub fn from_row(row: &SqliteRow) -> Self {
        let capabilities: String = row.get("capabilities");
        let custom_config: String = row.get("custom_config");
        let visible_models: String = row.get("visible_models");
        let hidden_models: String = row.get("hidden_models");
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            display_name: row.get("display_name"),
            api_base_url: row.get("api_base_url"),
            enabled: row.get::<i64, _>("enabled") != 0,
            capabilities: serde_json::from_str(&capabilities).unwrap_or_default(),
            custom_config: serde_json::from_str(&custom_config).unwrap_or(Value::Null),
            model_type: row.get("model_type"),
            visible_models: serde_json::from_str(&visible_models).unwrap_or_default(),
            hidden_models: serde_json::from_str(&hidden_models).unwrap_or_default(),
            api_keys_encrypted: row.get("api_keys_encrypted"),
            api_keys: None,
            conflict_of: row.get("conflict_of"),
            deleted_at: row.get("deleted_at"),
            purge_at: row.get("purge_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
