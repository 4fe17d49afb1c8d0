// src/locks.rs
// Per-user advisory locking (spec §5, §9 "Per-user locking" design note).
// sqlx's SQLite pool can hand out concurrent connections, so every mutating
// entry point for a given user serializes through this table before
// touching the store. `dashmap` gives lock-free concurrent access to the
// table itself; the table only ever grows (one entry per user seen).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(user_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Acquire the lock for `user_id`, serializing every mutating entry
    /// point for that user. The owned guard keeps its `Arc` alive, so it
    /// can be held across an `await` point without borrowing from `self`;
    /// drop it to release.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        self.entry(user_id).lock_owned().await
    }
}
