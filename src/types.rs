use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::share_code::ShareCode;

/// Unique identifier for a target (a vehicle and its owner).
///
/// This is a strongly-typed wrapper to avoid accidental mixing
/// of target IDs with other string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The record a share code resolves to.
///
/// Owned and persisted by the surrounding application. The dispatch core only
/// reads it: `provider_id` and `provider_config` are kept in their stored
/// string form and interpreted lazily on every dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,

    /// Licence plate, sent to providers as context.
    pub plate: String,

    /// Optional owner-facing label shown on the public page.
    pub label: Option<String>,

    pub share_code: ShareCode,

    /// Stored provider selection (e.g. `BARK`).
    pub provider_id: String,

    /// Opaque, provider-specific configuration string.
    pub provider_config: String,

    pub phone: Option<String>,
    pub notify_enabled: bool,
    pub call_enabled: bool,
}

impl Target {
    /// Create a target with notifications enabled and calls disabled.
    pub fn new(
        id: impl Into<String>,
        plate: impl Into<String>,
        share_code: ShareCode,
        provider_id: impl Into<String>,
        provider_config: impl Into<String>,
    ) -> Self {
        Self {
            id: TargetId(id.into()),
            plate: plate.into(),
            label: None,
            share_code,
            provider_id: provider_id.into(),
            provider_config: provider_config.into(),
            phone: None,
            notify_enabled: true,
            call_enabled: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set a phone number and enable the call flow.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self.call_enabled = true;
        self
    }

    pub fn with_notify_enabled(mut self, enabled: bool) -> Self {
        self.notify_enabled = enabled;
        self
    }

    pub fn with_call_enabled(mut self, enabled: bool) -> Self {
        self.call_enabled = enabled;
        self
    }
}

/// Message handed to a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Plate or label of the target, used as context by some providers.
    pub target_label: String,

    /// Message body. Blank messages are replaced by the configured default
    /// before an adapter sees them.
    pub message: String,
}

impl NotificationRequest {
    pub fn new(target_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target_label: target_label.into(),
            message: message.into(),
        }
    }

    /// Return a copy whose message falls back to `default` when blank.
    pub fn or_default_message(&self, default: &str) -> Self {
        let message = self.message.trim();
        Self {
            target_label: self.target_label.clone(),
            message: if message.is_empty() {
                default.to_string()
            } else {
                self.message.clone()
            },
        }
    }
}

/// Kind of public interaction recorded in the notification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    Notify,
    Call,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Notify => "NOTIFY",
            LogKind::Call => "CALL",
        }
    }
}

/// Append-only audit record, also the source of truth for rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub target_id: TargetId,
    pub kind: LogKind,
    pub message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationLogEntry {
    /// Create an entry stamped with the current time.
    pub fn now(target_id: TargetId, kind: LogKind, message: Option<String>) -> Self {
        Self {
            target_id,
            kind,
            message,
            occurred_at: Utc::now(),
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}
