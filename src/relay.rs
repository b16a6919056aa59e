//! Public flows behind a scanned link: look up a target, notify its owner,
//! or reveal the owner's phone number.

use std::sync::Arc;

use serde::Serialize;

use crate::dispatcher::Dispatcher;
use crate::error::{DispatchOutcome, RelayError, StoreError};
use crate::rate_limit::RateLimiter;
use crate::settings::Settings;
use crate::share_code::{ShareCode, ShareCodeGenerator};
use crate::storage::Storage;
use crate::transport::DispatchContext;
use crate::types::{LogKind, NotificationLogEntry, NotificationRequest, Target};

/// What an anonymous visitor may see about a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTarget {
    pub plate: String,
    pub label: Option<String>,
    pub notify_enabled: bool,
    pub call_enabled: bool,
}

impl From<&Target> for PublicTarget {
    fn from(target: &Target) -> Self {
        Self {
            plate: target.plate.clone(),
            label: target.label.clone(),
            notify_enabled: target.notify_enabled,
            call_enabled: target.call_enabled,
        }
    }
}

/// Visitor-facing outcome of a notify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyReply {
    Delivered { message: String },
    /// Not an error: the owner was notified recently enough.
    RateLimited { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReply {
    pub phone: Option<String>,
}

pub struct Relay {
    storage: Arc<dyn Storage>,
    dispatcher: Arc<Dispatcher>,
    limiter: RateLimiter,
    settings: Settings,
}

impl Relay {
    pub fn new(storage: Arc<dyn Storage>, dispatcher: Arc<Dispatcher>, settings: Settings) -> Self {
        let limiter = RateLimiter::new(storage.clone(), settings.rate_limit);
        Self {
            storage,
            dispatcher,
            limiter,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Codes that cannot be valid are reported as not found without a
    /// store round-trip.
    async fn resolve(&self, code: &str) -> Result<Target, RelayError> {
        let code = ShareCode::parse(code).map_err(|_| RelayError::NotFound)?;
        self.storage
            .find_target_by_share_code(&code)
            .await?
            .ok_or(RelayError::NotFound)
    }

    pub async fn lookup(&self, code: &str) -> Result<PublicTarget, RelayError> {
        let target = self.resolve(code).await?;
        Ok(PublicTarget::from(&target))
    }

    /// Notify the owner of the target behind `code`.
    ///
    /// Blank messages fall back to `notify_message` and the provider call runs
    /// under `request_timeout_secs`, both taken from this relay's [`Settings`].
    ///
    /// Every attempt that reaches a provider is logged, whether or not it was
    /// delivered. A store error while logging is reported through `tracing`
    /// and does not change the reply, so such an attempt may be missing from
    /// the rate-limit window. Configuration errors are returned without
    /// logging since nothing was sent.
    pub async fn notify(&self, code: &str, message: Option<&str>) -> Result<NotifyReply, RelayError> {
        let target = self.resolve(code).await?;
        if !target.notify_enabled {
            return Err(RelayError::NotifyDisabled);
        }

        let message = message.unwrap_or_default();
        if message.chars().count() > self.settings.max_message_len {
            return Err(RelayError::MessageTooLong {
                max: self.settings.max_message_len,
            });
        }
        let message = message.trim();

        let window = self.limiter.check(&target.id).await?;
        if !window.allowed() {
            return Ok(NotifyReply::RateLimited {
                message: self.settings.rate_limit_message.clone(),
            });
        }

        let request = NotificationRequest::new(target.plate.clone(), message)
            .or_default_message(&self.settings.notify_message);
        let ctx = DispatchContext::new().with_timeout(self.settings.request_timeout());
        let result = self
            .dispatcher
            .dispatch_with(&ctx, &target.provider_id, &target.provider_config, &request)
            .await?;

        // The provider has already been called; append failures leave the
        // reply unchanged.
        let logged = (!message.is_empty()).then(|| message.to_string());
        let entry = NotificationLogEntry::now(target.id.clone(), LogKind::Notify, logged);
        if let Err(err) = self.storage.append_log_entry(&entry).await {
            tracing::error!(
                target_id = target.id.as_str(),
                error = %err,
                "failed to record notify attempt"
            );
        }

        match result.outcome {
            DispatchOutcome::Delivered => Ok(NotifyReply::Delivered {
                message: self.settings.notify_success_message.clone(),
            }),
            DispatchOutcome::Failed(reason) => Err(RelayError::Undelivered {
                reason,
                detail: result.detail.unwrap_or_else(|| reason.to_string()),
            }),
        }
    }

    /// Reveal the owner's phone number and record the call.
    pub async fn call(&self, code: &str) -> Result<CallReply, RelayError> {
        let target = self.resolve(code).await?;
        if !target.call_enabled {
            return Err(RelayError::CallDisabled);
        }

        self.storage
            .append_log_entry(&NotificationLogEntry::now(target.id.clone(), LogKind::Call, None))
            .await?;
        tracing::info!(target_id = target.id.as_str(), "phone number revealed");

        Ok(CallReply {
            phone: target.phone,
        })
    }

    /// A fresh, unused share code for target creation or regeneration.
    pub async fn issue_share_code(&self) -> Result<ShareCode, StoreError> {
        ShareCodeGenerator::new().generate(self.storage.as_ref()).await
    }
}
