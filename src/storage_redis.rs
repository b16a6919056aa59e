use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::share_code::ShareCode;
use crate::storage::Storage;
use crate::types::{LogKind, NotificationLogEntry, Target, TargetId};

/// Redis-backed storage.
///
/// Log entries live in one sorted set per target and kind, scored by
/// unix milliseconds, so window counts are a single `ZCOUNT`. Members are
/// prefixed with a sequence number to keep identical entries distinct.
/// Targets are JSON values in a hash keyed by share code.
pub struct RedisStorage {
    client: redis::Client,
    prefix: String,
}

impl RedisStorage {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn log_key(&self, target_id: &TargetId, kind: LogKind) -> String {
        format!("{}:log:{}:{}", self.prefix, kind.as_str(), target_id.0)
    }

    fn seq_key(&self) -> String {
        format!("{}:log:seq", self.prefix)
    }

    fn targets_key(&self) -> String {
        format!("{}:targets", self.prefix)
    }

    async fn connection(&self) -> Result<redis::aio::Connection, StoreError> {
        self.client.get_tokio_connection().await.map_err(backend)
    }

    /// Insert or replace a target under its share code.
    pub async fn put_target(&self, target: &Target) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(target)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let _: () = conn
            .hset(self.targets_key(), target.share_code.as_str(), payload)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn backend(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl Storage for RedisStorage {
    async fn count_log_entries(
        &self,
        target_id: &TargetId,
        kind: LogKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        conn.zcount(self.log_key(target_id, kind), since.timestamp_millis(), "+inf")
            .await
            .map_err(backend)
    }

    async fn append_log_entry(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let seq: i64 = conn.incr(self.seq_key(), 1).await.map_err(backend)?;
        let payload = serde_json::to_string(entry)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let _: () = conn
            .zadd(
                self.log_key(&entry.target_id, entry.kind),
                format!("{seq}|{payload}"),
                entry.occurred_at.timestamp_millis(),
            )
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_target_by_share_code(&self, code: &ShareCode) -> Result<Option<Target>, StoreError> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn
            .hget(self.targets_key(), code.as_str())
            .await
            .map_err(backend)?;
        payload
            .map(|p| serde_json::from_str(&p).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()
    }
}
