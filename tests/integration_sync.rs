//! HTTP-level integration tests for the sync engine.
//!
//! Drives the real router with `tower::ServiceExt::oneshot` against a
//! temp-file-backed SQLite database, the same harness shape as the teacher's
//! own end-to-end tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use sync_core::api;
use sync_core::auth::create_token;
use sync_core::config::server::{
    AuthConfig, CryptoConfig, DatabaseConfig, LoggingConfig, PullConfig, RecycleBinConfig,
    ServerConfig,
};
use sync_core::config::SyncConfig;
use sync_core::state::AppState;

const JWT_SECRET: &str = "test-jwt-secret";
const ADMIN_KEY: &str = "test-admin-key";

async fn test_router(temp_dir: &TempDir, recycle_window_days: i64) -> Router {
    let db_path = temp_dir.path().join("sync.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let kek = base64::engine::general_purpose::STANDARD.encode([3u8; 32]);

    let config = SyncConfig {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
        database: DatabaseConfig { url: db_url, max_connections: 5 },
        logging: LoggingConfig { level: "error".to_string() },
        crypto: CryptoConfig { kek_b64: kek },
        auth: AuthConfig { jwt_signing_key: JWT_SECRET.to_string() },
        recycle_bin: RecycleBinConfig {
            window_days: recycle_window_days,
            admin_purge_key: ADMIN_KEY.to_string(),
            operation_retention_days: 30,
        },
        pull: PullConfig { default_limit: 500, max_limit: 2000 },
    };

    let state = Arc::new(AppState::new(config).await.expect("state init"));
    api::create_router(state)
}

fn token(user_id: i64) -> String {
    create_token(JWT_SECRET, user_id).unwrap()
}

async fn request(
    router: &Router,
    method: &str,
    path: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(user_id) = user_id {
        builder = builder.header("authorization", format!("Bearer {}", token(user_id)));
    }

    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: Value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }));

    (status, parsed)
}

async fn push(router: &Router, user_id: i64, ops: Vec<Value>) -> Value {
    let (status, body) =
        request(router, "POST", "/push", Some(user_id), Some(json!({ "operations": ops }))).await;
    assert_eq!(status, StatusCode::OK, "push failed: {:?}", body);
    body
}

async fn pull(router: &Router, user_id: i64, query: &str) -> Value {
    let path = if query.is_empty() { "/pull".to_string() } else { format!("/pull?{}", query) };
    let (status, body) = request(router, "GET", &path, Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK, "pull failed: {:?}", body);
    body
}

#[tokio::test]
async fn duplicate_op_id_replays_without_reapplying() {
    let temp_dir = TempDir::new().unwrap();
    let router = test_router(&temp_dir, 7).await;

    let op = json!({
        "op_id": "op-1",
        "op_type": "append_message",
        "data": {
            "id": "m1",
            "conversation_id": "c1",
            "role": "user",
            "content": "hello",
        },
    });

    // First push a conversation so append_message's parent lookup succeeds.
    push(
        &router,
        1,
        vec![json!({
            "op_id": "op-0",
            "op_type": "upsert_conversation",
            "data": { "id": "c1" },
        })],
    )
    .await;

    let first = push(&router, 1, vec![op.clone()]).await;
    let results = first["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "success");

    let second = push(&router, 1, vec![op]).await;
    let results = second["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "duplicate");
    assert_eq!(results[0]["result"], first["results"][0]["result"]);

    let pulled = pull(&router, 1, "").await;
    let messages = pulled["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1, "duplicate op_id must not insert a second message");
}

#[tokio::test]
async fn pull_gates_provider_keys_on_scope() {
    let temp_dir = TempDir::new().unwrap();
    let router = test_router(&temp_dir, 7).await;

    push(
        &router,
        2,
        vec![json!({
            "op_id": "op-provider",
            "op_type": "upsert_provider",
            "data": {
                "id": "p1",
                "display_name": "OpenAI",
                "api_base_url": "https://api.openai.com",
                "api_keys": ["sk-secret-1"],
            },
        })],
    )
    .await;

    // Default scopes don't include providers.config or providers.keys.
    let pulled = pull(&router, 2, "").await;
    assert_eq!(pulled["providers"].as_array().unwrap().len(), 0);

    let (status, _) = request(
        &router,
        "PUT",
        "/scopes",
        Some(2),
        Some(json!({ "enabled_scopes": ["providers.config"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let pulled = pull(&router, 2, "").await;
    let providers = pulled["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert!(providers[0].get("api_keys").is_none(), "keys scope not enabled yet");

    let (status, _) = request(
        &router,
        "PUT",
        "/scopes",
        Some(2),
        Some(json!({ "enabled_scopes": ["providers.config", "providers.keys"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let pulled = pull(&router, 2, "").await;
    let providers = pulled["providers"].as_array().unwrap();
    assert_eq!(providers[0]["api_keys"], json!(["sk-secret-1"]));
}

#[tokio::test]
async fn delete_then_recycle_bin_then_purge() {
    let temp_dir = TempDir::new().unwrap();
    let router = test_router(&temp_dir, 7).await;

    push(
        &router,
        3,
        vec![json!({
            "op_id": "op-conv",
            "op_type": "upsert_conversation",
            "data": { "id": "c1" },
        })],
    )
    .await;

    push(
        &router,
        3,
        vec![json!({
            "op_id": "op-del",
            "op_type": "delete",
            "data": { "type": "conversation", "id": "c1" },
        })],
    )
    .await;

    let (status, recycle) = request(&router, "GET", "/recycle-bin", Some(3), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recycle["conversations"].as_array().unwrap().len(), 1);

    let pulled = pull(&router, 3, "").await;
    assert_eq!(pulled["conversations"].as_array().unwrap().len(), 0, "deleted row hidden by default");

    let pulled_with_deleted = pull(&router, 3, "include_deleted=true").await;
    assert_eq!(pulled_with_deleted["conversations"].as_array().unwrap().len(), 1);

    // purge-expired only reaps rows whose purge_at has passed; the recycle
    // window here is 7 days, so nothing should be purged yet.
    let (status, purged) =
        request(&router, "POST", &format!("/purge-expired?admin_key={}", ADMIN_KEY), None, None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purged["purged"]["conversations"], 0);

    let (status, _) =
        request(&router, "POST", "/purge-expired?admin_key=wrong", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn regen_replaces_assistant_message_but_rejects_user_message() {
    let temp_dir = TempDir::new().unwrap();
    let router = test_router(&temp_dir, 7).await;

    push(
        &router,
        4,
        vec![
            json!({
                "op_id": "op-conv",
                "op_type": "upsert_conversation",
                "data": { "id": "c1" },
            }),
            json!({
                "op_id": "op-user-msg",
                "op_type": "append_message",
                "data": { "id": "u1", "conversation_id": "c1", "role": "user", "content": "hi" },
            }),
            json!({
                "op_id": "op-asst-msg",
                "op_type": "append_message",
                "data": { "id": "a1", "conversation_id": "c1", "role": "assistant", "content": "old answer" },
            }),
        ],
    )
    .await;

    let regen_user = push(
        &router,
        4,
        vec![json!({
            "op_id": "op-regen-bad",
            "op_type": "regen",
            "data": {
                "old_message_id": "u1",
                "new_message": { "id": "u1-v2", "content": "nope" },
            },
        })],
    )
    .await;
    assert_eq!(regen_user["results"][0]["status"], "error");

    push(
        &router,
        4,
        vec![json!({
            "op_id": "op-regen-ok",
            "op_type": "regen",
            "data": {
                "old_message_id": "a1",
                "new_message": { "id": "a1-v2", "content": "new answer" },
            },
        })],
    )
    .await;

    let pulled = pull(&router, 4, "include_deleted=true").await;
    let messages = pulled["messages"].as_array().unwrap();

    let old = messages.iter().find(|m| m["id"] == "a1").unwrap();
    assert!(old["deleted_at"].is_i64());
    assert_eq!(old["replaced_by"], "a1-v2");

    let new = messages.iter().find(|m| m["id"] == "a1-v2").unwrap();
    assert_eq!(new["content"], "new answer");
    assert!(new["deleted_at"].is_null());

    let convo = pulled["conversations"].as_array().unwrap();
    let convo = convo.iter().find(|c| c["id"] == "c1").unwrap();
    assert_eq!(convo["last_message"], "new answer");
}

#[tokio::test]
async fn fork_copies_history_up_to_fork_point_with_derived_ids() {
    let temp_dir = TempDir::new().unwrap();
    let router = test_router(&temp_dir, 7).await;

    push(
        &router,
        5,
        vec![
            json!({ "op_id": "op-conv", "op_type": "upsert_conversation", "data": { "id": "c1" } }),
            json!({
                "op_id": "op-m1",
                "op_type": "append_message",
                "data": { "id": "m1", "conversation_id": "c1", "role": "user", "content": "one" },
            }),
            json!({
                "op_id": "op-m2",
                "op_type": "append_message",
                "data": { "id": "m2", "conversation_id": "c1", "role": "assistant", "content": "two" },
            }),
        ],
    )
    .await;

    // A message appended after the fork point must not be copied.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    push(
        &router,
        5,
        vec![json!({
            "op_id": "op-m3",
            "op_type": "append_message",
            "data": { "id": "m3", "conversation_id": "c1", "role": "user", "content": "three" },
        })],
    )
    .await;

    let fork_result = push(
        &router,
        5,
        vec![json!({
            "op_id": "op-fork",
            "op_type": "fork",
            "data": {
                "parent_conversation_id": "c1",
                "fork_from_message_id": "m2",
                "new_conversation_id": "c1_branch",
            },
        })],
    )
    .await;
    assert_eq!(fork_result["results"][0]["status"], "success");

    let pulled = pull(&router, 5, "").await;
    let convs: Vec<_> = pulled["conversations"].as_array().unwrap().to_vec();
    let child = convs.iter().find(|c| c["id"] == "c1_branch").unwrap();
    assert_eq!(child["parent_conversation_id"], "c1");
    assert_eq!(child["fork_from_message_id"], "m2");

    let suffix = &"c1_branch"[..8.min("c1_branch".len())];
    let messages = pulled["messages"].as_array().unwrap();
    let branch_messages: Vec<_> = messages
        .iter()
        .filter(|m| m["conversation_id"] == "c1_branch")
        .collect();

    assert_eq!(branch_messages.len(), 2, "only m1 and m2 should be copied, not m3");

    let copied_m1 = branch_messages
        .iter()
        .find(|m| m["id"] == format!("m1_fork_{}", suffix))
        .expect("m1 copy with derived id");
    assert_eq!(copied_m1["content"], "one");

    assert!(
        branch_messages.iter().all(|m| m["id"] != format!("m3_fork_{}", suffix)),
        "message created after the fork point must not be copied"
    );
}
