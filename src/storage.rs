use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::share_code::ShareCode;
use crate::types::{LogKind, NotificationLogEntry, Target, TargetId};

/// The persistence operations the dispatch core relies on.
///
/// The notification log is append-only: entries are never mutated or
/// deleted through this trait.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Number of `kind` entries for `target_id` with `occurred_at >= since`.
    async fn count_log_entries(
        &self,
        target_id: &TargetId,
        kind: LogKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn append_log_entry(&self, entry: &NotificationLogEntry) -> Result<(), StoreError>;

    async fn find_target_by_share_code(&self, code: &ShareCode) -> Result<Option<Target>, StoreError>;
}

/// In-memory storage for tests and lightweight deployments.
#[derive(Default)]
pub struct InMemoryStorage {
    log: Mutex<Vec<NotificationLogEntry>>,
    targets: Mutex<HashMap<ShareCode, Target>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a target, keyed by its share code.
    pub async fn insert_target(&self, target: Target) {
        self.targets
            .lock()
            .await
            .insert(target.share_code.clone(), target);
    }

    /// Snapshot of the whole log, oldest first.
    pub async fn log_snapshot(&self) -> Vec<NotificationLogEntry> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn count_log_entries(
        &self,
        target_id: &TargetId,
        kind: LogKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let log = self.log.lock().await;
        let count = log
            .iter()
            .filter(|e| &e.target_id == target_id && e.kind == kind && e.occurred_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn append_log_entry(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        self.log.lock().await.push(entry.clone());
        Ok(())
    }

    async fn find_target_by_share_code(&self, code: &ShareCode) -> Result<Option<Target>, StoreError> {
        Ok(self.targets.lock().await.get(code).cloned())
    }
}
