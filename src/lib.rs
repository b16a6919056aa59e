//! Notification dispatch core for scan-to-notify vehicle alerts.
//!
//! A vehicle owner publishes a link keyed by a short [`ShareCode`]. Someone
//! blocked in by the car opens it and either alerts the owner through one of
//! six push / webhook providers or asks for the owner's phone number.
//!
//! ## Pieces
//! - [`ProviderCatalog`]: closed list of supported providers
//! - [`ProviderAdapter`]: one per provider; parse config, build the request,
//!   classify the response
//! - [`Dispatcher`]: routes a provider id to its adapter
//! - [`RateLimiter`]: sliding-window gate derived from the notification log
//! - [`ShareCodeGenerator`]: collision-checked public identifiers
//! - [`Relay`]: the public notify / call flows tying the above together
//!
//! ## Guarantees
//! - Unknown providers and malformed configs fail before any network I/O
//! - Exactly one outbound request per dispatch, never retried
//! - No in-process shared mutable state; counts come from [`Storage`]
//!
//! ## Non-Guarantees
//! - Delivery confirmation beyond the provider's immediate response
//! - Atomic rate limiting under concurrent requests for the same target

mod adapter;
mod catalog;
mod dispatcher;
mod error;
mod parse;
mod rate_limit;
mod relay;
mod settings;
mod share_code;
mod storage;
mod telemetry;
mod transport;
mod types;

#[cfg(feature = "redis")]
mod storage_redis;

#[cfg(feature = "postgres")]
mod storage_postgres;

pub use adapter::{
    BarkAdapter, OneBotAdapter, ProviderAdapter, WebhookBotAdapter, WxPusherAdapter,
    BARK_GROUP, DINGTALK_HOOK_BASE, FEISHU_HOOK_BASE, NOTIFICATION_TITLE, WECHAT_WORK_HOOK_BASE,
    WX_PUSHER_URL,
};
pub use catalog::{ProviderCatalog, ProviderDescriptor, ProviderId};
pub use dispatcher::{AdapterSet, Dispatcher, DispatcherConfig, DEFAULT_NOTIFY_MESSAGE};
pub use error::{
    DispatchError,
    DispatchOutcome,
    DispatchResult,
    FailureReason,
    RelayError,
    StoreError,
    TransportError,
};
pub use parse::{
    clamp_bark_volume,
    normalize_bark_endpoint,
    BarkConfig,
    BarkLevel,
    OneBotConfig,
    OneBotTarget,
    ProviderConfig,
    WebhookToken,
    WxPusherConfig,
};
pub use rate_limit::{RateLimitConfig, RateLimiter, WindowSnapshot};
pub use relay::{CallReply, NotifyReply, PublicTarget, Relay};
pub use settings::Settings;
pub use share_code::{ShareCode, ShareCodeError, ShareCodeGenerator, SHARE_CODE_ALPHABET, SHARE_CODE_LEN};
pub use storage::{InMemoryStorage, Storage};
pub use transport::{DispatchContext, HttpTransport, OutboundRequest, TransportResponse};
pub use types::{LogKind, NotificationLogEntry, NotificationRequest, Target, TargetId};

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;

#[cfg(feature = "redis")]
pub use storage_redis::RedisStorage;

#[cfg(feature = "postgres")]
pub use storage_postgres::PostgresStorage;
