//! Structured records for the pipe-delimited provider configuration strings.
//!
//! Configuration is stored as an opaque string per target and parsed eagerly
//! at the start of every dispatch. Required leading fields must be non-blank
//! after trimming; optional trailing fields fall back to defaults when they
//! are absent or blank. Parsing never performs I/O.

use crate::catalog::ProviderId;
use crate::error::DispatchError;

pub const BARK_DEFAULT_SOUND: &str = "multiwayinvitation";
pub const BARK_DEFAULT_VOLUME: f64 = 1.0;
pub const BARK_MAX_VOLUME: f64 = 10.0;

/// Split a raw config string into trimmed, position-preserving fields.
fn fields(raw: &str) -> Vec<&str> {
    raw.split('|').map(str::trim).collect()
}

/// Field at `index`, or `None` when absent or blank.
fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|value| !value.is_empty())
}

/// Interruption level accepted by Bark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarkLevel {
    #[default]
    Critical,
    Active,
    TimeSensitive,
    Passive,
}

impl BarkLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarkLevel::Critical => "critical",
            BarkLevel::Active => "active",
            BarkLevel::TimeSensitive => "timeSensitive",
            BarkLevel::Passive => "passive",
        }
    }

    /// Unrecognized values fall back to `critical`.
    fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some("active") => BarkLevel::Active,
            Some("timeSensitive") => BarkLevel::TimeSensitive,
            Some("passive") => BarkLevel::Passive,
            _ => BarkLevel::Critical,
        }
    }
}

/// `token|sound|endpoint|level|volume|call`
#[derive(Debug, Clone, PartialEq)]
pub struct BarkConfig {
    pub device_key: String,
    pub sound: String,
    /// Normalized push URL, always ending in `/push`.
    pub endpoint: String,
    pub level: BarkLevel,
    /// Clamped into `[0, 10]`; fractional values are kept.
    pub volume: f64,
    /// `false` when the call field is exactly `0`.
    pub call: bool,
}

impl BarkConfig {
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let fields = fields(raw);
        let device_key = field(&fields, 0)
            .ok_or_else(|| DispatchError::configuration(ProviderId::Bark, "Bark token 未填写"))?;
        let endpoint = field(&fields, 2).ok_or_else(|| {
            DispatchError::configuration(ProviderId::Bark, "Bark 推送 URL 未配置")
        })?;

        Ok(Self {
            device_key: device_key.to_string(),
            sound: field(&fields, 1).unwrap_or(BARK_DEFAULT_SOUND).to_string(),
            endpoint: normalize_bark_endpoint(endpoint),
            level: BarkLevel::parse_or_default(field(&fields, 3)),
            volume: clamp_bark_volume(field(&fields, 4)),
            call: field(&fields, 5) != Some("0"),
        })
    }
}

/// Prefix `https://` when no scheme is given and make the URL end in
/// exactly one `/push`.
pub fn normalize_bark_endpoint(raw: &str) -> String {
    let raw = raw.trim();
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    let with_scheme = if has_scheme {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let mut cleaned = with_scheme.trim_end_matches('/');
    let suffix_start = cleaned.len().saturating_sub("/push".len());
    if cleaned
        .get(suffix_start..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case("/push"))
    {
        cleaned = &cleaned[..suffix_start];
    }
    format!("{cleaned}/push")
}

/// Parse a volume, clamping into `[0, 10]`. Blank, non-numeric or
/// non-finite input yields the default of 1.
pub fn clamp_bark_volume(raw: Option<&str>) -> f64 {
    let Some(value) = raw.and_then(|v| v.parse::<f64>().ok()) else {
        return BARK_DEFAULT_VOLUME;
    };
    if !value.is_finite() {
        return BARK_DEFAULT_VOLUME;
    }
    value.clamp(0.0, BARK_MAX_VOLUME)
}

/// `appToken|uid`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WxPusherConfig {
    pub app_token: String,
    pub uid: String,
}

impl WxPusherConfig {
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let fields = fields(raw);
        match (field(&fields, 0), field(&fields, 1)) {
            (Some(app_token), Some(uid)) => Ok(Self {
                app_token: app_token.to_string(),
                uid: uid.to_string(),
            }),
            _ => Err(DispatchError::configuration(
                ProviderId::WxPusher,
                "WxPusher 配置格式错误，应形如 AT_xxx|UID_xxx",
            )),
        }
    }
}

/// Single webhook token used by the Feishu, WeCom and DingTalk bots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookToken(pub String);

impl WebhookToken {
    /// The whole trimmed config string is the token.
    pub fn parse(provider: ProviderId, raw: &str) -> Result<Self, DispatchError> {
        let token = raw.trim();
        if token.is_empty() {
            let name = match provider {
                ProviderId::FeishuBot => "飞书",
                ProviderId::WechatWorkBot => "企业微信",
                ProviderId::DingtalkBot => "钉钉",
                _ => "Webhook",
            };
            return Err(DispatchError::configuration(
                provider,
                format!("请输入{name} Webhook token"),
            ));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who receives a OneBot message, decided by the endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneBotTarget {
    User(String),
    Group(String),
}

impl OneBotTarget {
    pub fn field_name(&self) -> &'static str {
        match self {
            OneBotTarget::User(_) => "user_id",
            OneBotTarget::Group(_) => "group_id",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            OneBotTarget::User(id) | OneBotTarget::Group(id) => id,
        }
    }
}

/// `endpoint|token|recipient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneBotConfig {
    pub endpoint: String,
    /// Bearer token; `None` omits the `Authorization` header.
    pub access_token: Option<String>,
    pub target: OneBotTarget,
}

impl OneBotConfig {
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let fields = fields(raw);
        let (Some(endpoint), Some(recipient)) = (field(&fields, 0), field(&fields, 2)) else {
            return Err(DispatchError::configuration(
                ProviderId::Onebot,
                "OneBot 配置格式错误，应形如 http://host:port/send_private_msg|token|123456",
            ));
        };

        let target = if endpoint.contains("send_private_msg") {
            OneBotTarget::User(recipient.to_string())
        } else {
            OneBotTarget::Group(recipient.to_string())
        };

        Ok(Self {
            endpoint: endpoint.to_string(),
            access_token: field(&fields, 1).map(str::to_string),
            target,
        })
    }
}

/// A parsed configuration, tagged with the provider it belongs to.
///
/// A parse is only valid for the provider it was produced for; callers that
/// cache one must drop it whenever the target's provider changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Bark(BarkConfig),
    WxPusher(WxPusherConfig),
    FeishuBot(WebhookToken),
    WechatWorkBot(WebhookToken),
    DingtalkBot(WebhookToken),
    Onebot(OneBotConfig),
}

impl ProviderConfig {
    /// Parse `raw` with the grammar of `provider`.
    pub fn parse(provider: ProviderId, raw: &str) -> Result<Self, DispatchError> {
        Ok(match provider {
            ProviderId::Bark => ProviderConfig::Bark(BarkConfig::parse(raw)?),
            ProviderId::WxPusher => ProviderConfig::WxPusher(WxPusherConfig::parse(raw)?),
            ProviderId::FeishuBot => ProviderConfig::FeishuBot(WebhookToken::parse(provider, raw)?),
            ProviderId::WechatWorkBot => {
                ProviderConfig::WechatWorkBot(WebhookToken::parse(provider, raw)?)
            }
            ProviderId::DingtalkBot => {
                ProviderConfig::DingtalkBot(WebhookToken::parse(provider, raw)?)
            }
            ProviderId::Onebot => ProviderConfig::Onebot(OneBotConfig::parse(raw)?),
        })
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderConfig::Bark(_) => ProviderId::Bark,
            ProviderConfig::WxPusher(_) => ProviderId::WxPusher,
            ProviderConfig::FeishuBot(_) => ProviderId::FeishuBot,
            ProviderConfig::WechatWorkBot(_) => ProviderId::WechatWorkBot,
            ProviderConfig::DingtalkBot(_) => ProviderId::DingtalkBot,
            ProviderConfig::Onebot(_) => ProviderId::Onebot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        trailing_slash     = { "http://x.com/push/", "http://x.com/push" },
        no_scheme          = { "x.com", "https://x.com/push" },
        many_slashes       = { "https://api.day.app///", "https://api.day.app/push" },
        upper_push         = { "https://bark.me/PUSH", "https://bark.me/push" },
        upper_scheme       = { "HTTP://bark.me", "HTTP://bark.me/push" },
        with_path          = { "bark.me/self-hosted", "https://bark.me/self-hosted/push" },
    )]
    fn bark_endpoint_normalization(input: &str, expected: &str) {
        assert_eq!(normalize_bark_endpoint(input), expected);
    }

    #[yare::parameterized(
        above_max  = { Some("15"), 10.0 },
        below_min  = { Some("-3"), 0.0 },
        in_range   = { Some("7"), 7.0 },
        fractional = { Some("2.5"), 2.5 },
        text       = { Some("loud"), 1.0 },
        absent     = { None, 1.0 },
        infinite   = { Some("inf"), 1.0 },
    )]
    fn bark_volume_clamping(input: Option<&str>, expected: f64) {
        assert_eq!(clamp_bark_volume(input), expected);
    }

    #[test]
    fn bark_defaults_apply_to_blank_trailing_fields() {
        let config = BarkConfig::parse("key123| |bark.me| | |").unwrap();
        assert_eq!(config.device_key, "key123");
        assert_eq!(config.sound, BARK_DEFAULT_SOUND);
        assert_eq!(config.endpoint, "https://bark.me/push");
        assert_eq!(config.level, BarkLevel::Critical);
        assert_eq!(config.volume, 1.0);
        assert!(config.call);
    }

    #[test]
    fn bark_explicit_fields_are_kept() {
        let config = BarkConfig::parse("key|bell|https://bark.me|timeSensitive|4|0").unwrap();
        assert_eq!(config.sound, "bell");
        assert_eq!(config.level, BarkLevel::TimeSensitive);
        assert_eq!(config.volume, 4.0);
        assert!(!config.call);
    }

    #[test]
    fn bark_unknown_level_falls_back_to_critical() {
        let config = BarkConfig::parse("key||bark.me|urgent").unwrap();
        assert_eq!(config.level, BarkLevel::Critical);
    }

    #[yare::parameterized(
        empty         = { "" },
        blank_token   = { "  |bell|bark.me" },
        missing_url   = { "key|bell" },
        blank_url     = { "key|bell|  " },
    )]
    fn bark_missing_required_fields(raw: &str) {
        let err = BarkConfig::parse(raw).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration { provider: ProviderId::Bark, .. }));
    }

    #[test]
    fn wx_pusher_requires_both_fields() {
        assert!(WxPusherConfig::parse("AT_1|UID_1").is_ok());
        assert!(WxPusherConfig::parse("AT_1").is_err());
        assert!(WxPusherConfig::parse("|UID_1").is_err());
        assert!(WxPusherConfig::parse("AT_1| ").is_err());
    }

    #[test]
    fn webhook_token_is_the_whole_trimmed_string() {
        let token = WebhookToken::parse(ProviderId::FeishuBot, "  abc-123 \n").unwrap();
        assert_eq!(token.as_str(), "abc-123");
        let err = WebhookToken::parse(ProviderId::DingtalkBot, "   ").unwrap_err();
        assert_eq!(err.detail(), "请输入钉钉 Webhook token");
    }

    #[test]
    fn onebot_target_follows_endpoint_path() {
        let private = OneBotConfig::parse("http://127.0.0.1:3000/send_private_msg|tok|42").unwrap();
        assert_eq!(private.target, OneBotTarget::User("42".into()));
        assert_eq!(private.access_token.as_deref(), Some("tok"));

        let group = OneBotConfig::parse("http://127.0.0.1:3000/send_group_msg||99").unwrap();
        assert_eq!(group.target, OneBotTarget::Group("99".into()));
        assert_eq!(group.access_token, None);
    }

    #[test]
    fn onebot_requires_endpoint_and_recipient() {
        assert!(OneBotConfig::parse("http://h/send_private_msg|tok").is_err());
        assert!(OneBotConfig::parse("|tok|42").is_err());
    }

    #[test]
    fn provider_config_is_tagged_with_its_provider() {
        for (provider, raw) in [
            (ProviderId::Bark, "k||bark.me"),
            (ProviderId::WxPusher, "AT|UID"),
            (ProviderId::FeishuBot, "t"),
            (ProviderId::WechatWorkBot, "t"),
            (ProviderId::DingtalkBot, "t"),
            (ProviderId::Onebot, "http://h/send_group_msg||1"),
        ] {
            let parsed = ProviderConfig::parse(provider, raw).unwrap();
            assert_eq!(parsed.provider(), provider);
        }
    }
}
