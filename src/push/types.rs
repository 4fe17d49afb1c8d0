// src/push/types.rs
// Tagged sum type for push payloads (spec §9 design note: "Model as a
// tagged sum type ... reject unknown tags at parse time. Avoid late-bound
// field access.").

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct PushOperation {
    pub op_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    pub op_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockInput {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConversationData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub character_image_url: Option<String>,
    #[serde(default)]
    pub self_address: Option<String>,
    #[serde(default)]
    pub address_user: Option<String>,
    #[serde(default)]
    pub voice_file_url: Option<String>,
    #[serde(default)]
    pub persona_prompt: Option<String>,
    #[serde(default)]
    pub default_provider_id: Option<String>,
    #[serde(default)]
    pub session_provider_id: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub unread_count: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendMessageData {
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetData {
    #[serde(rename = "type")]
    pub target_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessageData {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegenData {
    pub old_message_id: String,
    pub new_message: NewMessageData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForkData {
    pub parent_conversation_id: String,
    pub fork_from_message_id: String,
    pub new_conversation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub copy_messages: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProviderData {
    pub id: String,
    pub display_name: String,
    pub api_base_url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub custom_config: Option<Value>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub visible_models: Option<Vec<String>>,
    #[serde(default)]
    pub hidden_models: Option<Vec<String>>,
    #[serde(default)]
    pub api_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum PushData {
    UpsertConversation(UpsertConversationData),
    AppendMessage(AppendMessageData),
    Delete(TargetData),
    Restore(TargetData),
    Regen(RegenData),
    Fork(ForkData),
    UpsertProvider(UpsertProviderData),
}

impl PushData {
    pub fn parse(op_type: &str, data: &Value) -> CoreResult<Self> {
        let invalid = |e: serde_json::Error| CoreError::invalid(format!("malformed operation data: {}", e));

        Ok(match op_type {
            "upsert_conversation" => {
                PushData::UpsertConversation(serde_json::from_value(data.clone()).map_err(invalid)?)
            }
            "append_message" => {
                PushData::AppendMessage(serde_json::from_value(data.clone()).map_err(invalid)?)
            }
            "delete" => PushData::Delete(serde_json::from_value(data.clone()).map_err(invalid)?),
            "restore" => PushData::Restore(serde_json::from_value(data.clone()).map_err(invalid)?),
            "regen" => PushData::Regen(serde_json::from_value(data.clone()).map_err(invalid)?),
            "fork" => PushData::Fork(serde_json::from_value(data.clone()).map_err(invalid)?),
            "upsert_provider" => {
                PushData::UpsertProvider(serde_json::from_value(data.clone()).map_err(invalid)?)
            }
            other => return Err(CoreError::invalid(format!("unknown op_type: {}", other))),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
#[serde(rename_all = "lowercase")]
pub enum PushResult {
    Success { op_id: String, result: Value },
    Duplicate { op_id: String, result: Value },
    Error { op_id: String, error: String },
}
