//! Metric helpers. Counters compile to no-ops unless the `metrics` feature
//! is enabled; structured logging always goes through `tracing`.

use crate::catalog::ProviderId;

pub(crate) const DISPATCH_SUCCESS: &str = "notify.dispatch.success";
pub(crate) const DISPATCH_FAILURE: &str = "notify.dispatch.failure";
pub(crate) const DISPATCH_CONFIG_ERROR: &str = "notify.dispatch.config_error";
pub(crate) const DISPATCH_UNKNOWN_PROVIDER: &str = "notify.dispatch.unknown_provider";
pub(crate) const RATE_LIMITED: &str = "notify.rate_limited";
pub(crate) const SHARE_CODE_COLLISION: &str = "notify.share_code.collision";

#[cfg(feature = "metrics")]
pub(crate) fn metric_inc(name: &'static str) {
    metrics::increment_counter!(name);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn metric_inc(_name: &'static str) {}

#[cfg(feature = "metrics")]
pub(crate) fn metric_inc_provider(name: &'static str, provider: ProviderId) {
    metrics::increment_counter!(name, "provider" => provider.as_str());
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn metric_inc_provider(_name: &'static str, _provider: ProviderId) {}
