use std::future::{pending, Future};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// A single outbound JSON POST built by a provider adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl OutboundRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as JSON. Anything that is not a JSON object is treated as an
    /// empty object, so classification falls through to "not success".
    pub fn json_or_empty(&self) -> Value {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::Object(Default::default()),
        }
    }
}

/// Performs one HTTP exchange. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// Deadline and cancellation supplied by the calling context.
///
/// Both are optional. When either fires before the provider answers, the
/// in-flight request is dropped and the dispatch fails with
/// [`TransportError::Timeout`] or [`TransportError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `call` under this context's deadline and cancellation signal.
    ///
    /// An already-cancelled token wins over the call, so nothing is sent.
    pub async fn guard<F, T>(&self, call: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(TransportError::Cancelled),
            _ = expired => Err(TransportError::Timeout),
            result = call => result,
        }
    }
}

/// reqwest-backed transport.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(self.timeout)
            .json(&request.body);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(feature = "http")]
fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}
