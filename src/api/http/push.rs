// src/api/http/push.rs
// POST /push — Push Service (C4), spec §6.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::AuthUser;
use crate::push::types::{PushOperation, PushResult};
use crate::push::PushService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PushBody {
    pub operations: Vec<PushOperation>,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub results: Vec<PushResult>,
    pub server_time: i64,
}

pub async fn push(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PushBody>,
) -> Result<Json<PushResponse>, ApiError> {
    let ts = chrono::Utc::now().timestamp_millis();
    let _guard = state.user_locks.acquire(user_id).await;

    let service = PushService::new(
        &state.resources,
        &state.config.crypto.kek_b64,
        state.config.recycle_bin.window_ms(),
    );

    let results = service.push(user_id, ts, body.operations).await?;

    Ok(Json(PushResponse {
        results,
        server_time: ts,
    }))
}
