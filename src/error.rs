use std::fmt;

use thiserror::Error;

use crate::catalog::ProviderId;

/// Detail used when a provider rejects a message without saying why.
pub(crate) const GENERIC_FAILURE: &str = "通知发送失败";

/// Errors raised while dispatching a notification.
///
/// `Configuration` and `UnknownProvider` are always detected *before* any
/// network I/O. `Transport` and `ProviderLogic` only occur after a request
/// was attempted; the [`Dispatcher`](crate::Dispatcher) folds those two into a
/// failed [`DispatchResult`] instead of returning them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Stored provider configuration is malformed or incomplete.
    /// Caller-fixable; never retried.
    #[error("{reason}")]
    Configuration {
        provider: ProviderId,
        reason: String,
    },

    /// Provider id is not part of the catalog.
    #[error("未知的通知渠道: {provider_id}")]
    UnknownProvider { provider_id: String },

    /// Network failure, timeout, cancellation or non-2xx status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Well-formed response in which the provider rejected the message.
    #[error("{message}")]
    ProviderLogic {
        provider: ProviderId,
        message: String,
    },
}

impl DispatchError {
    pub(crate) fn configuration(provider: ProviderId, reason: impl Into<String>) -> Self {
        DispatchError::Configuration {
            provider,
            reason: reason.into(),
        }
    }

    /// Human-readable detail suitable for showing to the person who
    /// triggered the dispatch.
    pub fn detail(&self) -> String {
        match self {
            DispatchError::Transport(TransportError::Status { status, body }) => {
                if body.trim().is_empty() {
                    format!("Request failed ({status})")
                } else {
                    body.clone()
                }
            }
            other => {
                let text = other.to_string();
                if text.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    text
                }
            }
        }
    }

    /// Whether this error was detected before any request left the process.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            DispatchError::Configuration { .. } | DispatchError::UnknownProvider { .. }
        )
    }
}

/// Failures of the outbound HTTP exchange itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status; `body` is kept verbatim.
    #[error("request failed ({status}): {body}")]
    Status { status: u16, body: String },
}

/// Final outcome of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed(FailureReason),
}

/// Reasons why a dispatch attempt that reached the network failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    Cancelled,
    Network,
    HttpStatus(u16),
    /// Provider returned a well-formed rejection.
    Rejected,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout =>
                write!(f, "request timed out"),
            FailureReason::Cancelled =>
                write!(f, "request cancelled"),
            FailureReason::Network =>
                write!(f, "network error"),
            FailureReason::HttpStatus(status) =>
                write!(f, "provider returned status {status}"),
            FailureReason::Rejected =>
                write!(f, "provider rejected the message"),
        }
    }
}

/// Result of one dispatch: an outcome plus an optional human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    pub detail: Option<String>,
}

impl DispatchResult {
    pub fn delivered() -> Self {
        Self {
            outcome: DispatchOutcome::Delivered,
            detail: None,
        }
    }

    pub fn failed(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Failed(reason),
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Delivered)
    }

    /// Fold a post-flight error into a failed result.
    ///
    /// Returns the error back when it is a pre-flight error, which must
    /// surface to the caller as `Err`.
    pub(crate) fn from_error(err: DispatchError) -> Result<Self, DispatchError> {
        let reason = match &err {
            DispatchError::Transport(TransportError::Timeout) => FailureReason::Timeout,
            DispatchError::Transport(TransportError::Cancelled) => FailureReason::Cancelled,
            DispatchError::Transport(TransportError::Network(_)) => FailureReason::Network,
            DispatchError::Transport(TransportError::Status { status, .. }) => {
                FailureReason::HttpStatus(*status)
            }
            DispatchError::ProviderLogic { .. } => FailureReason::Rejected,
            DispatchError::Configuration { .. } | DispatchError::UnknownProvider { .. } => {
                return Err(err)
            }
        };
        Ok(Self::failed(reason, err.detail()))
    }
}

/// Errors reported by a [`Storage`](crate::Storage) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored record could not be decoded: {0}")]
    Serialization(String),
}

/// Errors from the public notify / call flows.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("车辆未找到")]
    NotFound,

    #[error("车主未开启消息通知")]
    NotifyDisabled,

    #[error("车主未开启电话通知")]
    CallDisabled,

    #[error("message exceeds {max} characters")]
    MessageTooLong { max: usize },

    /// Dispatch was attempted (and logged) but did not deliver.
    #[error("{detail}")]
    Undelivered {
        reason: FailureReason,
        detail: String,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
