// ── Dispatch ──
//
// Resolves the display's service in the live push-sink registry and
// performs a best-effort invocation. Every failure mode here is logged
// and swallowed: the cycle's result never depends on dispatch success,
// and the next tick retries with freshly resolved data.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;
use crate::payload::DisplayFrame;

/// Service domain the display firmware registers under.
pub const DEFAULT_SERVICE_DOMAIN: &str = "esphome";

/// Exact service name tried first.
pub const DEFAULT_SERVICE_NAME: &str = "solar_display_update_display";

/// Fallback suffix for instances where the firmware registers with an
/// instance-specific prefix (e.g. `solar_display_9f3ac1_update_display`).
pub const DEFAULT_SERVICE_SUFFIX: &str = "_update_display";

/// Where to push frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub domain: String,
    pub service: String,
    pub suffix: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_SERVICE_DOMAIN.to_owned(),
            service: DEFAULT_SERVICE_NAME.to_owned(),
            suffix: DEFAULT_SERVICE_SUFFIX.to_owned(),
        }
    }
}

/// Invocation access to the external push sink.
///
/// Implemented by [`HaClient`](soldeck_api::HaClient) for real use and by
/// in-memory fakes in tests.
pub trait PushSink {
    /// The service names currently registered within a domain.
    fn list_services(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    /// Invoke a service with the given frame.
    fn call(
        &self,
        domain: &str,
        service: &str,
        frame: &DisplayFrame,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Pick the service to invoke from the registry snapshot.
///
/// Exact configured name first. Otherwise the suffix scan recovers
/// prefixed registrations; ties break to the lexicographically smallest
/// match so resolution is deterministic regardless of registry order.
pub fn resolve_service(registered: &[String], config: &SinkConfig) -> Option<String> {
    if registered.iter().any(|name| *name == config.service) {
        return Some(config.service.clone());
    }
    registered
        .iter()
        .filter(|name| name.ends_with(&config.suffix))
        .min()
        .cloned()
}

/// Push one frame, best effort.
pub async fn dispatch<K: PushSink + Sync>(sink: &K, config: &SinkConfig, frame: &DisplayFrame) {
    let registered = match sink.list_services(&config.domain).await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(domain = %config.domain, error = %e, "service registry unavailable, skipping dispatch");
            return;
        }
    };

    let Some(service) = resolve_service(&registered, config) else {
        warn!(
            domain = %config.domain,
            service = %config.service,
            "no matching display service registered, skipping dispatch"
        );
        return;
    };

    if let Err(e) = sink.call(&config.domain, &service, frame).await {
        warn!(service = %service, error = %e, "display push failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn exact_name_wins_over_suffix_matches() {
        let registered = names(&[
            "aaa_update_display",
            "solar_display_update_display",
            "zzz_update_display",
        ]);
        assert_eq!(
            resolve_service(&registered, &SinkConfig::default()),
            Some("solar_display_update_display".to_owned())
        );
    }

    #[test]
    fn suffix_fallback_picks_lexicographically_smallest() {
        let registered = names(&[
            "solar_display_f00d_update_display",
            "solar_display_0a1b_update_display",
            "other_node_restart",
        ]);
        assert_eq!(
            resolve_service(&registered, &SinkConfig::default()),
            Some("solar_display_0a1b_update_display".to_owned())
        );
    }

    #[test]
    fn no_match_resolves_to_none() {
        let registered = names(&["other_node_restart", "other_node_set_led"]);
        assert_eq!(resolve_service(&registered, &SinkConfig::default()), None);
        assert_eq!(resolve_service(&[], &SinkConfig::default()), None);
    }
}
