//! The closed set of supported notification providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Identifier of a supported provider.
///
/// The set is closed: adding a provider means adding a variant here, which
/// forces every exhaustive match (the dispatcher's adapter routing included)
/// to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderId {
    Bark,
    WxPusher,
    FeishuBot,
    WechatWorkBot,
    DingtalkBot,
    Onebot,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Bark,
        ProviderId::WxPusher,
        ProviderId::FeishuBot,
        ProviderId::WechatWorkBot,
        ProviderId::DingtalkBot,
        ProviderId::Onebot,
    ];

    /// Stored wire form, e.g. `WX_PUSHER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Bark => "BARK",
            ProviderId::WxPusher => "WX_PUSHER",
            ProviderId::FeishuBot => "FEISHU_BOT",
            ProviderId::WechatWorkBot => "WECHAT_WORK_BOT",
            ProviderId::DingtalkBot => "DINGTALK_BOT",
            ProviderId::Onebot => "ONEBOT",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownProvider {
                provider_id: s.to_string(),
            })
    }
}

/// User-facing description of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    #[serde(rename = "name")]
    pub display_name: &'static str,
    #[serde(rename = "hint")]
    pub config_hint: &'static str,
}

const DESCRIPTORS: [ProviderDescriptor; 6] = [
    ProviderDescriptor {
        id: ProviderId::Bark,
        display_name: "Bark",
        config_hint: "token|sound|url|level|volume|call（level 默认 critical, volume 默认 1, call 默认 1）",
    },
    ProviderDescriptor {
        id: ProviderId::WxPusher,
        display_name: "WxPusher",
        config_hint: "AT_xxx|UID_xxx",
    },
    ProviderDescriptor {
        id: ProviderId::FeishuBot,
        display_name: "飞书机器人",
        config_hint: "Webhook token",
    },
    ProviderDescriptor {
        id: ProviderId::WechatWorkBot,
        display_name: "企业微信机器人",
        config_hint: "Webhook token",
    },
    ProviderDescriptor {
        id: ProviderId::DingtalkBot,
        display_name: "钉钉机器人",
        config_hint: "Webhook token",
    },
    ProviderDescriptor {
        id: ProviderId::Onebot,
        display_name: "OneBot / NapCat / Lagrange",
        config_hint: "http://host/send_private_msg|access_token|接收人ID",
    },
];

/// Immutable provider table, built once and injected where needed.
#[derive(Debug, Clone, Copy)]
pub struct ProviderCatalog {
    entries: &'static [ProviderDescriptor],
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProviderCatalog {
    /// The six built-in providers in display order.
    pub const fn standard() -> Self {
        Self {
            entries: &DESCRIPTORS,
        }
    }

    /// All providers, in fixed order.
    pub fn list(&self) -> &'static [ProviderDescriptor] {
        self.entries
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id.as_str() == id)
    }

    pub fn descriptor(&self, id: ProviderId) -> Option<&'static ProviderDescriptor> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Resolve a stored provider id, as required before persisting a
    /// target's provider selection.
    pub fn validate(&self, id: &str) -> Result<ProviderId, DispatchError> {
        self.entries
            .iter()
            .find(|entry| entry.id.as_str() == id)
            .map(|entry| entry.id)
            .ok_or_else(|| DispatchError::UnknownProvider {
                provider_id: id.to_string(),
            })
    }
}
