// src/push/mod.rs
// Push Service (C4) — spec §4.4. Executes a batch of write operations with
// per-operation idempotency, dispatching each to the Operation Executor
// (C5). See DESIGN.md / SPEC_FULL.md for the per-operation-commit policy
// this core chooses over a single whole-batch transaction.

pub mod types;

use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::error::CoreResult;
use crate::executor::Executor;
use crate::resource::ResourceStore;
use types::{PushData, PushOperation, PushResult};

pub struct PushService<'a> {
    store: &'a ResourceStore,
    kek_b64: &'a str,
    recycle_window_ms: i64,
}

impl<'a> PushService<'a> {
    pub fn new(store: &'a ResourceStore, kek_b64: &'a str, recycle_window_ms: i64) -> Self {
        Self {
            store,
            kek_b64,
            recycle_window_ms,
        }
    }

    pub async fn push(
        &self,
        user_id: i64,
        ts: i64,
        operations: Vec<PushOperation>,
    ) -> CoreResult<Vec<PushResult>> {
        let executor = Executor::new(self.store, self.kek_b64, self.recycle_window_ms);
        let mut results = Vec::with_capacity(operations.len());

        for op in operations {
            if let Some(stored) = find_operation(self.store.pool(), &op.op_id, user_id).await? {
                results.push(PushResult::Duplicate {
                    op_id: op.op_id,
                    result: stored,
                });
                continue;
            }

            let outcome = self.apply(&executor, user_id, ts, &op).await;

            match outcome {
                Ok(result) => {
                    record_operation(
                        self.store.pool(),
                        &op.op_id,
                        user_id,
                        op.device_id.as_deref(),
                        &op.op_type,
                        &op.data,
                        &result,
                        ts,
                    )
                    .await?;

                    results.push(PushResult::Success {
                        op_id: op.op_id,
                        result,
                    });
                }
                Err(e) => {
                    warn!(op_id = %op.op_id, op_type = %op.op_type, error = %e, "push operation failed");
                    results.push(PushResult::Error {
                        op_id: op.op_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(results)
    }

    async fn apply(
        &self,
        executor: &Executor<'_>,
        user_id: i64,
        ts: i64,
        op: &PushOperation,
    ) -> CoreResult<Value> {
        let data = PushData::parse(&op.op_type, &op.data)?;

        match data {
            PushData::UpsertConversation(d) => executor.upsert_conversation(user_id, ts, d).await,
            PushData::AppendMessage(d) => executor.append_message(user_id, ts, d).await,
            PushData::Delete(d) => executor.delete(user_id, ts, d).await,
            PushData::Restore(d) => executor.restore(user_id, d).await,
            PushData::Regen(d) => executor.regen(user_id, ts, d).await,
            PushData::Fork(d) => executor.fork(user_id, ts, d).await,
            PushData::UpsertProvider(d) => executor.upsert_provider(user_id, ts, d).await,
        }
    }
}

async fn find_operation(pool: &SqlitePool, op_id: &str, user_id: i64) -> CoreResult<Option<Value>> {
    let row = sqlx::query("SELECT result_json FROM sync_operations WHERE op_id = ? AND user_id = ?")
        .bind(op_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(match row {
        Some(row) => {
            let raw: String = row.get("result_json");
            Some(serde_json::from_str(&raw).unwrap_or(Value::Null))
        }
        None => None,
    })
}

#[allow(clippy::too_many_arguments)]
async fn record_operation(
    pool: &SqlitePool,
    op_id: &str,
    user_id: i64,
    device_id: Option<&str>,
    op_type: &str,
    input: &Value,
    result: &Value,
    ts: i64,
) -> CoreResult<()> {
    let input_json = serde_json::to_string(input).unwrap_or_else(|_| "null".to_string());
    let result_json = serde_json::to_string(result).unwrap_or_else(|_| "null".to_string());

    sqlx::query(
        "INSERT INTO sync_operations (op_id, user_id, device_id, op_type, input_json, result_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(op_id)
    .bind(user_id)
    .bind(device_id)
    .bind(op_type)
    .bind(input_json)
    .bind(result_json)
    .bind(ts)
    .execute(pool)
    .await?;

    Ok(())
}
