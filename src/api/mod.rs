// src/api/mod.rs
// HTTP surface over the sync engine.

pub mod error;
pub mod http;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health_check))
        .route("/ready", get(http::readiness_check))
        .route("/live", get(http::liveness_check))
        .route("/scopes", get(http::scopes::get_scopes).put(http::scopes::put_scopes))
        .route("/pull", get(http::pull::pull))
        .route("/push", post(http::push::push))
        .route("/recycle-bin", get(http::recycle_bin::recycle_bin))
        .route("/purge-expired", post(http::purge::purge_expired))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
