//! One adapter per provider: parse the stored config, build the outbound
//! request, classify the response.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::catalog::ProviderId;
use crate::error::{DispatchError, DispatchResult, TransportError};
use crate::parse::{BarkConfig, OneBotConfig, WebhookToken, WxPusherConfig};
use crate::transport::{DispatchContext, HttpTransport, OutboundRequest};
use crate::types::NotificationRequest;

pub const NOTIFICATION_TITLE: &str = "挪车通知";
pub const BARK_GROUP: &str = "MoveMyCar";

pub const WX_PUSHER_URL: &str = "https://wxpusher.zjiecode.com/api/send/message";
pub const FEISHU_HOOK_BASE: &str = "https://open.feishu.cn/open-apis/bot/v2/hook/";
pub const WECHAT_WORK_HOOK_BASE: &str = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=";
pub const DINGTALK_HOOK_BASE: &str = "https://oapi.dingtalk.com/robot/send?access_token=";

/// Shared capability of every provider adapter.
///
/// `build` and `classify` are pure; [`send`](ProviderAdapter::send) wires them
/// around exactly one transport call. Configuration errors are raised by
/// `build`, so they always surface before any I/O.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Parse `config` and build the provider request for `request`.
    fn build(
        &self,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<OutboundRequest, DispatchError>;

    /// Interpret a 2xx response body.
    fn classify(&self, body: &Value) -> Result<(), DispatchError>;

    /// Parse, call, classify. Post-flight failures are folded into a failed
    /// [`DispatchResult`]; only configuration errors are returned as `Err`.
    async fn send(
        &self,
        config: &str,
        request: &NotificationRequest,
        transport: &dyn HttpTransport,
        ctx: &DispatchContext,
    ) -> Result<DispatchResult, DispatchError> {
        let outbound = self.build(config, request)?;

        let attempt = async {
            let response = ctx.guard(transport.post_json(&outbound)).await?;
            if !response.is_success() {
                return Err(DispatchError::Transport(TransportError::Status {
                    status: response.status,
                    body: response.body,
                }));
            }
            self.classify(&response.json_or_empty())
        };

        match attempt.await {
            Ok(()) => Ok(DispatchResult::delivered()),
            Err(err) => DispatchResult::from_error(err),
        }
    }
}

/// Numeric code at `field`, if present and integral.
fn code(body: &Value, field: &str) -> Option<i64> {
    body.get(field).and_then(Value::as_i64)
}

/// Provider rejection carrying the provider's own message, or `fallback`.
fn rejection(provider: ProviderId, body: &Value, field: &str, fallback: &str) -> DispatchError {
    let message = body
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or(fallback);
    DispatchError::ProviderLogic {
        provider,
        message: message.to_string(),
    }
}

/// Bark (`https://<server>/push`). Success: `code == 200`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarkAdapter;

#[async_trait]
impl ProviderAdapter for BarkAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Bark
    }

    fn build(
        &self,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<OutboundRequest, DispatchError> {
        let config = BarkConfig::parse(config)?;
        let mut body = json!({
            "body": request.message,
            "title": NOTIFICATION_TITLE,
            "device_key": config.device_key,
            "sound": config.sound,
            "group": BARK_GROUP,
            "level": config.level.as_str(),
            "volume": config.volume,
        });
        if config.call {
            body["call"] = json!("1");
        }
        Ok(OutboundRequest::new(config.endpoint, body))
    }

    fn classify(&self, body: &Value) -> Result<(), DispatchError> {
        if code(body, "code") == Some(200) {
            return Ok(());
        }
        Err(rejection(self.provider(), body, "message", "Bark 推送失败"))
    }
}

/// WxPusher. Success: `code` is `1000` or `0`.
#[derive(Debug, Clone)]
pub struct WxPusherAdapter {
    url: String,
}

impl Default for WxPusherAdapter {
    fn default() -> Self {
        Self {
            url: WX_PUSHER_URL.to_string(),
        }
    }
}

impl WxPusherAdapter {
    /// Point at a different API host, e.g. a self-hosted relay.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ProviderAdapter for WxPusherAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::WxPusher
    }

    fn build(
        &self,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<OutboundRequest, DispatchError> {
        let config = WxPusherConfig::parse(config)?;
        let body = json!({
            "appToken": config.app_token,
            "content": request.message,
            "contentType": 1,
            "summary": format!("挪车-{}", request.target_label),
            "uids": [config.uid],
        });
        Ok(OutboundRequest::new(self.url.clone(), body))
    }

    fn classify(&self, body: &Value) -> Result<(), DispatchError> {
        if matches!(code(body, "code"), Some(1000) | Some(0)) {
            return Ok(());
        }
        Err(rejection(self.provider(), body, "msg", "WxPusher 推送失败"))
    }
}

/// Token-addressed chat bot webhooks: the token is appended to a fixed base.
#[derive(Debug, Clone)]
pub struct WebhookBotAdapter {
    provider: ProviderId,
    base: String,
}

impl WebhookBotAdapter {
    pub fn feishu() -> Self {
        Self::with_base(ProviderId::FeishuBot, FEISHU_HOOK_BASE)
    }

    pub fn wechat_work() -> Self {
        Self::with_base(ProviderId::WechatWorkBot, WECHAT_WORK_HOOK_BASE)
    }

    pub fn dingtalk() -> Self {
        Self::with_base(ProviderId::DingtalkBot, DINGTALK_HOOK_BASE)
    }

    /// `base` is used verbatim as the prefix of the token.
    pub fn with_base(provider: ProviderId, base: impl Into<String>) -> Self {
        Self {
            provider,
            base: base.into(),
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self.provider {
            ProviderId::FeishuBot => "飞书机器人推送失败",
            ProviderId::WechatWorkBot => "企业微信机器人推送失败",
            ProviderId::DingtalkBot => "钉钉机器人推送失败",
            _ => "机器人推送失败",
        }
    }
}

#[async_trait]
impl ProviderAdapter for WebhookBotAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn build(
        &self,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<OutboundRequest, DispatchError> {
        let token = WebhookToken::parse(self.provider, config)?;
        let body = match self.provider {
            ProviderId::FeishuBot => json!({
                "msg_type": "text",
                "content": { "text": request.message },
            }),
            _ => json!({
                "msgtype": "text",
                "text": { "content": request.message },
            }),
        };
        Ok(OutboundRequest::new(
            format!("{}{}", self.base, token.as_str()),
            body,
        ))
    }

    fn classify(&self, body: &Value) -> Result<(), DispatchError> {
        // Feishu reports `code`/`msg`, WeCom and DingTalk `errcode`/`errmsg`.
        let (code_field, message_field) = match self.provider {
            ProviderId::FeishuBot => ("code", "msg"),
            _ => ("errcode", "errmsg"),
        };
        if code(body, code_field) == Some(0) {
            return Ok(());
        }
        Err(rejection(self.provider, body, message_field, self.fallback_message()))
    }
}

/// OneBot v11 HTTP API (NapCat, Lagrange, ...). Success: `retcode == 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneBotAdapter;

#[async_trait]
impl ProviderAdapter for OneBotAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Onebot
    }

    fn build(
        &self,
        config: &str,
        request: &NotificationRequest,
    ) -> Result<OutboundRequest, DispatchError> {
        let config = OneBotConfig::parse(config)?;
        let recipient = config.target.recipient();
        // Implementations expect numeric ids; keep non-numeric ids as text.
        let recipient = recipient
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(recipient));

        let mut body = json!({ "message": request.message });
        body[config.target.field_name()] = recipient;

        let mut outbound = OutboundRequest::new(config.endpoint, body);
        if let Some(token) = config.access_token {
            outbound = outbound.with_header("Authorization", format!("Bearer {token}"));
        }
        Ok(outbound)
    }

    fn classify(&self, body: &Value) -> Result<(), DispatchError> {
        if code(body, "retcode") == Some(0) {
            return Ok(());
        }
        Err(rejection(self.provider(), body, "message", "OneBot 推送失败"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NotificationRequest {
        NotificationRequest::new("京A12345", "please move")
    }

    #[test]
    fn bark_request_shape() {
        let outbound = BarkAdapter
            .build("dev-key|bell|bark.example.com/|active|3|1", &request())
            .unwrap();
        assert_eq!(outbound.url, "https://bark.example.com/push");
        assert_eq!(outbound.body["device_key"], "dev-key");
        assert_eq!(outbound.body["title"], NOTIFICATION_TITLE);
        assert_eq!(outbound.body["group"], BARK_GROUP);
        assert_eq!(outbound.body["level"], "active");
        assert_eq!(outbound.body["volume"], 3.0);
        assert_eq!(outbound.body["call"], "1");
        assert_eq!(outbound.body["body"], "please move");
    }

    #[test]
    fn bark_fractional_volume_is_sent_unrounded() {
        let outbound = BarkAdapter
            .build("dev-key||bark.example.com||2.5", &request())
            .unwrap();
        assert_eq!(outbound.body["volume"], 2.5);
    }

    #[test]
    fn bark_call_flag_zero_omits_call() {
        let outbound = BarkAdapter
            .build("dev-key||bark.example.com|||0", &request())
            .unwrap();
        assert!(outbound.body.get("call").is_none());
    }

    #[test]
    fn wx_pusher_summary_carries_the_plate() {
        let outbound = WxPusherAdapter::default()
            .build("AT_1|UID_1", &request())
            .unwrap();
        assert_eq!(outbound.url, WX_PUSHER_URL);
        assert_eq!(outbound.body["summary"], "挪车-京A12345");
        assert_eq!(outbound.body["uids"], json!(["UID_1"]));
        assert_eq!(outbound.body["contentType"], 1);
    }

    #[test]
    fn webhook_bots_address_token_by_url() {
        let feishu = WebhookBotAdapter::feishu().build(" tok ", &request()).unwrap();
        assert_eq!(feishu.url, format!("{FEISHU_HOOK_BASE}tok"));
        assert_eq!(feishu.body["content"]["text"], "please move");

        let wecom = WebhookBotAdapter::wechat_work().build("tok", &request()).unwrap();
        assert_eq!(wecom.url, format!("{WECHAT_WORK_HOOK_BASE}tok"));
        assert_eq!(wecom.body["text"]["content"], "please move");

        let dingtalk = WebhookBotAdapter::dingtalk().build("tok", &request()).unwrap();
        assert_eq!(dingtalk.url, format!("{DINGTALK_HOOK_BASE}tok"));
        assert_eq!(dingtalk.body["msgtype"], "text");
    }

    #[test]
    fn onebot_private_and_group_recipients() {
        let private = OneBotAdapter
            .build("http://bot:3000/send_private_msg|secret|10001", &request())
            .unwrap();
        assert_eq!(private.body["user_id"], 10001);
        assert!(private.body.get("group_id").is_none());
        assert_eq!(private.header("Authorization"), Some("Bearer secret"));

        let group = OneBotAdapter
            .build("http://bot:3000/send_group_msg||20002", &request())
            .unwrap();
        assert_eq!(group.body["group_id"], 20002);
        assert_eq!(group.header("Authorization"), None);
    }

    #[test]
    fn rejection_prefers_the_provider_message() {
        let err = WxPusherAdapter::default()
            .classify(&json!({ "code": 1001, "msg": "appToken不正确" }))
            .unwrap_err();
        assert_eq!(err.detail(), "appToken不正确");

        let err = BarkAdapter.classify(&json!({ "code": 400 })).unwrap_err();
        assert_eq!(err.detail(), "Bark 推送失败");
    }

    #[test]
    fn string_codes_are_not_success() {
        assert!(BarkAdapter.classify(&json!({ "code": "200" })).is_err());
        assert!(OneBotAdapter.classify(&json!({ "retcode": "0" })).is_err());
    }
}
