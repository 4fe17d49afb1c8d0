// src/api/http/pull.rs
// GET /pull — Pull Service (C3), spec §6.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::auth::AuthUser;
use crate::pull::{PullCursors, PullRequest, PullResponse, PullService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PullQuery {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub conversations_since: Option<i64>,
    #[serde(default)]
    pub messages_since: Option<i64>,
    #[serde(default)]
    pub providers_since: Option<i64>,
    #[serde(default)]
    pub include_deleted: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn pull(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullResponse>, ApiError> {
    let now = chrono::Utc::now().timestamp_millis();

    let limit = query
        .limit
        .unwrap_or(state.config.pull.default_limit)
        .clamp(1, state.config.pull.max_limit);

    let service = PullService::new(&state.resources, &state.scopes, &state.config.crypto.kek_b64);

    let request = PullRequest {
        cursors: PullCursors {
            conversations_since: query.conversations_since.unwrap_or(0),
            messages_since: query.messages_since.unwrap_or(0),
            providers_since: query.providers_since.unwrap_or(0),
        },
        include_deleted: query.include_deleted.unwrap_or(false),
        limit,
    };

    let response = service.pull(user_id, request, now).await?;
    Ok(Json(response))
}
