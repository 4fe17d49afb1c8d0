// src/api/http/recycle_bin.rs
// GET /recycle-bin — spec §6. Rows with `deleted_at` set and `purge_at` in
// the future (not yet reaped).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::auth::AuthUser;
use crate::resource::{Conversation, Provider, SyncMessage};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RecycleBinResponse {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<SyncMessage>,
    pub providers: Vec<Provider>,
    pub server_time: i64,
}

pub async fn recycle_bin(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<RecycleBinResponse>, ApiError> {
    let now = chrono::Utc::now().timestamp_millis();

    let conversations = state.resources.conversations_in_recycle_bin(user_id, now).await?;
    let mut messages = state.resources.messages_in_recycle_bin(user_id, now).await?;
    let providers = state.resources.providers_in_recycle_bin(user_id, now).await?;

    let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
    let mut blocks_by_message = state.resources.blocks_for_messages(&ids).await?;
    for m in messages.iter_mut() {
        m.blocks = blocks_by_message.remove(&m.id).unwrap_or_default();
    }

    Ok(Json(RecycleBinResponse {
        conversations,
        messages,
        providers,
        server_time: now,
    }))
}
