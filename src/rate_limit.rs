use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::storage::Storage;
use crate::telemetry::{metric_inc, RATE_LIMITED};
use crate::types::{LogKind, TargetId};

/// Sliding-window limit on notify attempts per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,
}

fn default_window_secs() -> u64 {
    300
}

fn default_max_attempts() -> u64 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Result of one window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u64,
    pub max_attempts: u64,
    pub window_secs: u64,
    pub window_start: DateTime<Utc>,
}

impl WindowSnapshot {
    pub fn allowed(&self) -> bool {
        self.count < self.max_attempts
    }

    pub fn remaining(&self) -> u64 {
        self.max_attempts.saturating_sub(self.count)
    }
}

/// Gates dispatch on the number of recent `Notify` log entries.
///
/// There is no in-process counter: every check is a count query against the
/// log, so the log stays the only source of truth. Check and append are
/// separate store calls. Two requests for the same target arriving together
/// can both pass before either is logged; this overshoot is accepted.
#[derive(Clone)]
pub struct RateLimiter {
    storage: Arc<dyn Storage>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(storage: Arc<dyn Storage>, config: RateLimitConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// `true` when fewer than `max_attempts` notify entries for `target_id`
    /// fall within the trailing `window_secs`.
    pub async fn allow(
        &self,
        target_id: &TargetId,
        window_secs: u64,
        max_attempts: u64,
    ) -> Result<bool, StoreError> {
        let snapshot = self
            .evaluate_at(target_id, window_secs, max_attempts, Utc::now())
            .await?;
        Ok(snapshot.allowed())
    }

    /// Evaluate the configured window for `target_id`.
    pub async fn check(&self, target_id: &TargetId) -> Result<WindowSnapshot, StoreError> {
        self.evaluate_at(
            target_id,
            self.config.window_secs,
            self.config.max_attempts,
            Utc::now(),
        )
        .await
    }

    pub async fn evaluate_at(
        &self,
        target_id: &TargetId,
        window_secs: u64,
        max_attempts: u64,
        now: DateTime<Utc>,
    ) -> Result<WindowSnapshot, StoreError> {
        let window_start = window_start(now, window_secs);
        let count = self
            .storage
            .count_log_entries(target_id, LogKind::Notify, window_start)
            .await?;

        let snapshot = WindowSnapshot {
            count,
            max_attempts,
            window_secs,
            window_start,
        };
        if !snapshot.allowed() {
            metric_inc(RATE_LIMITED);
            tracing::info!(
                target_id = target_id.as_str(),
                count,
                limit = max_attempts,
                window_secs,
                "notify rate limited"
            );
        }
        Ok(snapshot)
    }
}

/// Earliest timestamp still inside the window. Windows too large to
/// represent start at the beginning of time.
fn window_start(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    i64::try_from(window_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
