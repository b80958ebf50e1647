// ── Coordinator ──
//
// Owns the rotation state and the update-cycle scheduler. One cycle =
// resolve every configured source, run the rotation state machine, build
// the payload, push it, publish it. Cycles run strictly serially on a
// single spawned task; the dispatch await completes before the next tick
// is polled.
//
// The task runs for the coordinator's lifetime whether or not anyone
// subscribes to the published payload -- this system is a pure push sink
// with no consumer-facing state to observe.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use soldeck_api::{HaClient, TlsMode, TransportConfig};

use crate::config::{ConnectionConfig, OptionsHandle, TlsVerification};
use crate::dispatch::{self, PushSink, SinkConfig};
use crate::error::CoreError;
use crate::payload::{self, DisplayFrame, Payload};
use crate::resolve::{self, StateStore};
use crate::rotation::{PageSet, RotationState};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Generic over its collaborators so tests
/// can substitute in-memory fakes for the Home Assistant client.
pub struct Coordinator<S, K> {
    inner: Arc<CoordinatorInner<S, K>>,
}

impl<S, K> Clone for Coordinator<S, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<S, K> {
    store: S,
    sink: K,
    options: OptionsHandle,
    sink_config: SinkConfig,
    rotation: Mutex<RotationState>,
    /// Last raw payload. `send_replace` keeps it retained even with zero
    /// receivers, so the tick task never depends on subscribers.
    latest: watch::Sender<Option<Arc<Payload>>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S, K> Coordinator<S, K>
where
    S: StateStore + Send + Sync + 'static,
    K: PushSink + Send + Sync + 'static,
{
    /// Create a coordinator over explicit collaborators. Does NOT start
    /// the scheduler -- call [`start()`](Self::start).
    pub fn with_collaborators(
        store: S,
        sink: K,
        options: OptionsHandle,
        sink_config: SinkConfig,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                sink,
                options,
                sink_config,
                rotation: Mutex::new(RotationState::new()),
                latest,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// The shared options handle, for out-of-band updates.
    pub fn options(&self) -> &OptionsHandle {
        &self.inner.options
    }

    /// Run one full update cycle and return the raw payload.
    ///
    /// The return value is independent of dispatch success: a failed push
    /// is logged and the payload still comes back fully populated.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Payload {
        let options = self.inner.options.load();

        let values = resolve::sample(&self.inner.store, &options.sources).await;

        let pages = PageSet::from_flags(&options.pages.enabled);
        let position = {
            let mut rotation = self.inner.rotation.lock().expect("rotation lock poisoned");
            rotation.advance(
                &pages,
                options.pages.switch_mode,
                options.pages.rotation_interval(),
                now,
            )
        };

        let payload = payload::assemble(values, position, options.show_kw, now);
        let frame = DisplayFrame::from(&payload);
        dispatch::dispatch(&self.inner.sink, &self.inner.sink_config, &frame).await;

        self.inner.latest.send_replace(Some(Arc::new(payload.clone())));
        payload
    }

    /// Spawn the scheduler task.
    ///
    /// Runs an initial cycle immediately, then one cycle per sample
    /// interval until [`shutdown()`](Self::shutdown). Idempotent-ish:
    /// calling twice replaces the stored handle but the token is shared,
    /// so don't.
    pub fn start(&self) {
        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(tick_task(coordinator, cancel));
        *self.inner.task.lock().expect("task lock poisoned") = Some(handle);
    }

    /// Stop the scheduler deterministically.
    ///
    /// Cancels the token and awaits the task, so no cycle is left
    /// in flight past this call.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().expect("task lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Observe published payloads.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Payload>>> {
        self.inner.latest.subscribe()
    }

    /// The most recently published payload, if any cycle has run.
    pub fn latest(&self) -> Option<Arc<Payload>> {
        self.inner.latest.borrow().clone()
    }
}

impl Coordinator<HaClient, HaClient> {
    /// Connect to Home Assistant and build a coordinator over it.
    ///
    /// Verifies the API is reachable and the token accepted before
    /// returning. Does NOT start the scheduler.
    pub async fn connect(
        connection: &ConnectionConfig,
        options: OptionsHandle,
        sink_config: SinkConfig,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &connection.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: connection.timeout,
        };

        let client = HaClient::new(connection.url.clone(), &connection.token, &transport)?;
        let message = client.api_status().await?;
        info!(url = %connection.url, %message, "connected to Home Assistant");

        Ok(Self::with_collaborators(
            client.clone(),
            client,
            options,
            sink_config,
        ))
    }
}

// ── Scheduler task ──────────────────────────────────────────────────

async fn tick_task<S, K>(coordinator: Coordinator<S, K>, cancel: CancellationToken)
where
    S: StateStore + Send + Sync + 'static,
    K: PushSink + Send + Sync + 'static,
{
    // Initial cycle: the display shouldn't sit blank for a full sample
    // interval after startup.
    coordinator.run_cycle(Utc::now()).await;

    let mut period = coordinator.inner.options.load().pages.sample_interval();
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("update cycle tick");
                coordinator.run_cycle(Utc::now()).await;

                // Options may have been swapped out-of-band; re-arm the
                // timer when the configured cadence changed.
                let configured = coordinator.inner.options.load().pages.sample_interval();
                if configured != period {
                    debug!(secs = configured.as_secs(), "sample interval changed, re-arming");
                    period = configured;
                    interval = tokio::time::interval(period);
                    interval.tick().await;
                }
            }
        }
    }
    debug!("coordinator tick task stopped");
}

// ── HaClient collaborator impls ─────────────────────────────────────

impl StateStore for HaClient {
    async fn get_state(&self, entity_id: &str) -> Result<Option<soldeck_api::EntityState>, CoreError> {
        Ok(HaClient::get_state(self, entity_id).await?)
    }
}

impl PushSink for HaClient {
    async fn list_services(&self, domain: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.domain_services(domain).await?)
    }

    async fn call(&self, domain: &str, service: &str, frame: &DisplayFrame) -> Result<(), CoreError> {
        Ok(self.call_service(domain, service, frame).await?)
    }
}
