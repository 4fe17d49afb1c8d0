// src/api/http/scopes.rs
// GET/PUT /scopes — Scope Registry (C1), spec §6.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScopesResponse {
    pub enabled_scopes: Vec<String>,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct PutScopesBody {
    pub enabled_scopes: Vec<String>,
}

pub async fn get_scopes(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ScopesResponse>, ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let scopes = state.scopes.get_scopes(user_id, now).await?;

    Ok(Json(ScopesResponse {
        enabled_scopes: scopes.enabled_scopes,
        updated_at: scopes.updated_at,
    }))
}

pub async fn put_scopes(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PutScopesBody>,
) -> Result<Json<ScopesResponse>, ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let _guard = state.user_locks.acquire(user_id).await;

    let scopes = state.scopes.put_scopes(user_id, body.enabled_scopes, now).await?;

    Ok(Json(ScopesResponse {
        enabled_scopes: scopes.enabled_scopes,
        updated_at: scopes.updated_at,
    }))
}
