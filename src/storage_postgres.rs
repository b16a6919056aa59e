use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Client;

use crate::error::StoreError;
use crate::share_code::ShareCode;
use crate::storage::Storage;
use crate::types::{LogKind, NotificationLogEntry, Target, TargetId};

/// Postgres-backed storage. Tables are created on construction if missing.
pub struct PostgresStorage {
    client: Client,
}

impl PostgresStorage {
    pub async fn new(client: Client) -> Result<Self, tokio_postgres::Error> {
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS notification_log (
                    id BIGSERIAL PRIMARY KEY,
                    target_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    message TEXT,
                    occurred_at TIMESTAMPTZ NOT NULL
                )",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS notification_log_window
                 ON notification_log (target_id, kind, occurred_at)",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE TABLE IF NOT EXISTS targets (
                    share_code TEXT PRIMARY KEY,
                    payload JSONB NOT NULL
                )",
                &[],
            )
            .await?;

        Ok(Self { client })
    }

    /// Insert or replace a target under its share code.
    pub async fn put_target(&self, target: &Target) -> Result<(), StoreError> {
        let payload = serde_json::to_value(target)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.client
            .execute(
                "INSERT INTO targets (share_code, payload)
                 VALUES ($1, $2)
                 ON CONFLICT (share_code) DO UPDATE SET payload = EXCLUDED.payload",
                &[&target.share_code.as_str(), &payload],
            )
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn backend(err: tokio_postgres::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn count_log_entries(
        &self,
        target_id: &TargetId,
        kind: LogKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let row = self
            .client
            .query_one(
                "SELECT COUNT(*) FROM notification_log
                 WHERE target_id = $1 AND kind = $2 AND occurred_at >= $3",
                &[&target_id.as_str(), &kind.as_str(), &since],
            )
            .await
            .map_err(backend)?;
        let count: i64 = row.try_get(0).map_err(backend)?;
        Ok(count.max(0) as u64)
    }

    async fn append_log_entry(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO notification_log (target_id, kind, message, occurred_at)
                 VALUES ($1, $2, $3, $4)",
                &[
                    &entry.target_id.as_str(),
                    &entry.kind.as_str(),
                    &entry.message,
                    &entry.occurred_at,
                ],
            )
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_target_by_share_code(&self, code: &ShareCode) -> Result<Option<Target>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT payload FROM targets WHERE share_code = $1",
                &[&code.as_str()],
            )
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: serde_json::Value = row.try_get(0).map_err(backend)?;
        serde_json::from_value(payload)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
