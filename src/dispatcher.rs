use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::adapter::{BarkAdapter, OneBotAdapter, ProviderAdapter, WebhookBotAdapter, WxPusherAdapter};
use crate::catalog::{ProviderCatalog, ProviderId};
use crate::error::{DispatchError, DispatchOutcome, DispatchResult};
use crate::telemetry::{
    metric_inc, metric_inc_provider, DISPATCH_CONFIG_ERROR, DISPATCH_FAILURE, DISPATCH_SUCCESS,
    DISPATCH_UNKNOWN_PROVIDER,
};
use crate::transport::{DispatchContext, HttpTransport};
use crate::types::NotificationRequest;

pub const DEFAULT_NOTIFY_MESSAGE: &str = "您好，有人需要您挪车，请及时处理。";

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sent when the request carries a blank message.
    pub default_message: String,
    /// Deadline applied by [`Dispatcher::dispatch`] when the caller does not
    /// supply its own context.
    pub request_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_NOTIFY_MESSAGE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// The adapter bound to each provider variant.
#[derive(Debug, Clone)]
pub struct AdapterSet {
    pub bark: BarkAdapter,
    pub wx_pusher: WxPusherAdapter,
    pub feishu: WebhookBotAdapter,
    pub wechat_work: WebhookBotAdapter,
    pub dingtalk: WebhookBotAdapter,
    pub onebot: OneBotAdapter,
}

impl Default for AdapterSet {
    fn default() -> Self {
        Self {
            bark: BarkAdapter,
            wx_pusher: WxPusherAdapter::default(),
            feishu: WebhookBotAdapter::feishu(),
            wechat_work: WebhookBotAdapter::wechat_work(),
            dingtalk: WebhookBotAdapter::dingtalk(),
            onebot: OneBotAdapter,
        }
    }
}

impl AdapterSet {
    /// Exhaustive over the closed provider set.
    pub fn get(&self, provider: ProviderId) -> &dyn ProviderAdapter {
        match provider {
            ProviderId::Bark => &self.bark,
            ProviderId::WxPusher => &self.wx_pusher,
            ProviderId::FeishuBot => &self.feishu,
            ProviderId::WechatWorkBot => &self.wechat_work,
            ProviderId::DingtalkBot => &self.dingtalk,
            ProviderId::Onebot => &self.onebot,
        }
    }
}

/// Single entry point for sending a notification through a provider.
///
/// Stateless apart from its injected collaborators, so one instance can be
/// shared across request handlers without locking.
pub struct Dispatcher {
    catalog: ProviderCatalog,
    adapters: AdapterSet,
    transport: Arc<dyn HttpTransport>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Dispatcher backed by a reqwest client.
    #[cfg(feature = "http")]
    pub fn new(config: DispatcherConfig) -> Self {
        let transport = Arc::new(crate::transport::ReqwestTransport::new(config.request_timeout));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: DispatcherConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            catalog: ProviderCatalog::standard(),
            adapters: AdapterSet::default(),
            transport,
            config,
        }
    }

    pub fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the adapters, e.g. to point bots at a proxy.
    pub fn with_adapters(mut self, adapters: AdapterSet) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch under the configured request timeout.
    pub async fn dispatch(
        &self,
        provider_id: &str,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<DispatchResult, DispatchError> {
        let ctx = DispatchContext::new().with_timeout(self.config.request_timeout);
        self.dispatch_with(&ctx, provider_id, config, request).await
    }

    /// Dispatch under a caller-supplied deadline / cancellation context.
    ///
    /// Returns `Err` only for unknown providers and configuration errors,
    /// both detected before any network call. Everything that happens after
    /// the request is sent is reported through the returned
    /// [`DispatchResult`].
    pub async fn dispatch_with(
        &self,
        ctx: &DispatchContext,
        provider_id: &str,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<DispatchResult, DispatchError> {
        let provider = match self.catalog.validate(provider_id) {
            Ok(provider) => provider,
            Err(err) => {
                metric_inc(DISPATCH_UNKNOWN_PROVIDER);
                tracing::warn!(provider_id, "unknown notification provider");
                return Err(err);
            }
        };

        let request = request.or_default_message(&self.config.default_message);
        let adapter = self.adapters.get(provider);
        let span = tracing::info_span!(
            "notify.dispatch",
            provider = provider.as_str(),
            plate = %request.target_label,
        );

        async {
            let start = Instant::now();
            let result = adapter
                .send(config, &request, self.transport.as_ref(), ctx)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(DispatchResult {
                    outcome: DispatchOutcome::Delivered,
                    ..
                }) => {
                    metric_inc_provider(DISPATCH_SUCCESS, provider);
                    tracing::info!(elapsed_ms, "notification delivered");
                }
                Ok(DispatchResult {
                    outcome: DispatchOutcome::Failed(reason),
                    detail,
                }) => {
                    metric_inc_provider(DISPATCH_FAILURE, provider);
                    tracing::warn!(
                        elapsed_ms,
                        reason = %reason,
                        detail = detail.as_deref().unwrap_or_default(),
                        "notification failed"
                    );
                }
                Err(err) => {
                    metric_inc_provider(DISPATCH_CONFIG_ERROR, provider);
                    tracing::warn!(error = %err, "provider configuration rejected");
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
