#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use movemycar_dispatch::{
    Dispatcher, DispatcherConfig, HttpTransport, InMemoryStorage, LogKind, NotificationLogEntry,
    OutboundRequest, ShareCode, Storage, StoreError, Target, TargetId, TransportError,
    TransportResponse,
};

/// Transport that records every request and replays a canned response.
pub struct StubTransport {
    calls: Mutex<Vec<OutboundRequest>>,
    response: Mutex<Result<TransportResponse, TransportError>>,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Mutex::new(Ok(TransportResponse::new(status, body))),
            delay: None,
        })
    }

    pub fn failing(err: TransportError) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Mutex::new(Err(err)),
            delay: None,
        })
    }

    /// Answers with `body` after `delay`.
    pub fn slow(delay: Duration, body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Mutex::new(Ok(TransportResponse::new(200, body))),
            delay: Some(delay),
        })
    }

    pub fn set_response(&self, status: u16, body: &str) {
        *self.response.lock() = Ok(TransportResponse::new(status, body));
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn post_json(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.calls.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().clone()
    }
}

pub fn dispatcher(transport: Arc<StubTransport>) -> Dispatcher {
    Dispatcher::with_transport(DispatcherConfig::default(), transport)
}

/// Storage wrapper counting share-code lookups.
#[derive(Default)]
pub struct CountingStorage {
    pub inner: InMemoryStorage,
    lookups: AtomicUsize,
}

impl CountingStorage {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn count_log_entries(
        &self,
        target_id: &TargetId,
        kind: LogKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.inner.count_log_entries(target_id, kind, since).await
    }

    async fn append_log_entry(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        self.inner.append_log_entry(entry).await
    }

    async fn find_target_by_share_code(&self, code: &ShareCode) -> Result<Option<Target>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_target_by_share_code(code).await
    }
}

pub fn target(code: &str, provider: &str, config: &str) -> Target {
    Target::new(
        format!("target-{code}"),
        "京A12345",
        ShareCode::parse(code).expect("valid share code"),
        provider,
        config,
    )
}

/// Per provider: (id, valid config, config missing a required field,
/// documented success body, rejection body, rejection detail).
pub const PROVIDER_CASES: [(&str, &str, &str, &str, &str, &str); 6] = [
    (
        "BARK",
        "dev-key||bark.example.com",
        "dev-key",
        r#"{"code":200,"message":"success"}"#,
        r#"{"code":400,"message":"failed to push"}"#,
        "failed to push",
    ),
    (
        "WX_PUSHER",
        "AT_abc|UID_def",
        "AT_abc",
        r#"{"code":1000,"msg":"处理成功","success":true}"#,
        r#"{"code":1001,"msg":"appToken不正确"}"#,
        "appToken不正确",
    ),
    (
        "FEISHU_BOT",
        "hook-token",
        "   ",
        r#"{"code":0,"msg":"success"}"#,
        r#"{"code":19001,"msg":"param invalid: incoming webhook access token invalid"}"#,
        "param invalid: incoming webhook access token invalid",
    ),
    (
        "WECHAT_WORK_BOT",
        "hook-key",
        "",
        r#"{"errcode":0,"errmsg":"ok"}"#,
        r#"{"errcode":93000,"errmsg":"invalid webhook url"}"#,
        "invalid webhook url",
    ),
    (
        "DINGTALK_BOT",
        "access-token",
        " \t ",
        r#"{"errcode":0,"errmsg":"ok"}"#,
        r#"{"errcode":300001,"errmsg":"token is not exist"}"#,
        "token is not exist",
    ),
    (
        "ONEBOT",
        "http://bot.local:3000/send_private_msg|secret|10001",
        "http://bot.local:3000/send_private_msg|secret",
        r#"{"status":"ok","retcode":0,"data":{"message_id":1}}"#,
        r#"{"status":"failed","retcode":1404,"message":"user not found"}"#,
        "user not found",
    ),
];

pub fn seed_notify_entries(target_id: &TargetId, ages_secs: &[i64]) -> Vec<NotificationLogEntry> {
    let now = Utc::now();
    ages_secs
        .iter()
        .map(|age| {
            NotificationLogEntry::now(target_id.clone(), LogKind::Notify, None)
                .at(now - chrono::Duration::seconds(*age))
        })
        .collect()
}
