// src/api/http/purge.rs
// POST /purge-expired — operator escape hatch for the recycle-bin reaper
// (C6), guarded by a shared secret. spec §6, §9.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::error::CoreError;
use crate::reaper::{self, ReaperReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    pub admin_key: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub purged: ReaperReport,
    pub server_time: i64,
}

pub async fn purge_expired(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResponse>, ApiError> {
    if query.admin_key != state.config.recycle_bin.admin_purge_key {
        return Err(CoreError::Unauthenticated.into());
    }

    let now = chrono::Utc::now().timestamp_millis();
    let retention_ms = state.config.recycle_bin.operation_retention_days * 24 * 60 * 60 * 1000;
    let cutoff = now - retention_ms;

    let report = reaper::sweep(&state.resources, now, cutoff).await?;

    Ok(Json(PurgeResponse {
        purged: report,
        server_time: now,
    }))
}
