// ── Stats aggregation ──
//
// Fan-out/fan-in collection over the controller facade. One `collect`
// call authenticates once, fetches every resource concurrently, and
// tolerates per-resource failures: a partial result is still a result.
// Concurrent callers coalesce onto a single in-flight batch through a
// `Shared` future, and the shared outcome is an `Arc` so late joiners
// get the same allocation instead of a copy.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ConnectionMode;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{AggregateResult, SystemSnapshot};

/// How often the background keep-alive touches the controller.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(120);

type CollectFuture = Shared<BoxFuture<'static, Result<Arc<AggregateResult>, CoreError>>>;

struct AggregatorInner {
    controller: Controller,
    in_flight: tokio::sync::Mutex<Option<CollectFuture>>,
}

/// Concurrent stats collector with single-flight deduplication.
#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<AggregatorInner>,
}

impl StatsAggregator {
    pub fn new(controller: Controller) -> Self {
        Self {
            inner: Arc::new(AggregatorInner {
                controller,
                in_flight: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.inner.controller
    }

    /// Run one collection batch, or join the batch already in flight.
    ///
    /// Callers arriving while a batch runs receive the same `Arc`-shared
    /// result (success or failure) rather than triggering a second
    /// round of upstream requests.
    pub async fn collect(&self) -> Result<Arc<AggregateResult>, CoreError> {
        let fut = {
            let mut guard = self.inner.in_flight.lock().await;
            if let Some(fut) = guard.clone() {
                debug!("joining in-flight collection batch");
                fut
            } else {
                let inner = Arc::clone(&self.inner);
                let fut: CollectFuture = async move {
                    let result = collect_once(&inner.controller).await;
                    // Clear the slot so the next collect starts fresh.
                    inner.in_flight.lock().await.take();
                    result.map(Arc::new)
                }
                .boxed()
                .shared();
                *guard = Some(fut.clone());
                fut
            }
        };
        fut.await
    }

    /// Spawn a background task that keeps the cookie session warm.
    ///
    /// Local deployments only -- API keys don't lapse, so cloud
    /// connections return `None`. The task pings a lightweight endpoint
    /// each interval (re-authenticating if the session already lapsed)
    /// and logs failures without escalating; the next real collection
    /// will surface anything persistent.
    pub fn spawn_keep_alive(&self, interval: Duration) -> Option<KeepAliveHandle> {
        if self.inner.controller.mode() != ConnectionMode::Local {
            return None;
        }
        let controller = self.inner.controller.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so the cadence
            // starts one interval after spawn.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if controller.session().is_authenticated() {
                            if let Err(e) = controller.system_info().await {
                                warn!(error = %e, "keep-alive ping failed");
                            }
                        } else if let Err(e) = controller.login().await {
                            warn!(error = %e, "keep-alive re-login failed");
                        }
                    }
                }
            }
            debug!("keep-alive task stopped");
        });
        Some(KeepAliveHandle { cancel, task })
    }
}

/// Handle to a running keep-alive task. Dropping it without calling
/// [`KeepAliveHandle::stop`] leaves the task running until the runtime
/// shuts down.
pub struct KeepAliveHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    /// Stop the task and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Record a settled fetch: keep successes, drop capability gaps
/// quietly, log and record real failures.
fn settle<T>(
    name: &str,
    result: Result<T, CoreError>,
    failures: &mut Vec<(String, String)>,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(CoreError::Unsupported { .. }) => None,
        Err(e) => {
            warn!(resource = name, error = %e, "resource fetch failed");
            failures.push((name.to_owned(), e.to_string()));
            None
        }
    }
}

async fn collect_once(controller: &Controller) -> Result<AggregateResult, CoreError> {
    // Authenticate up front so the fan-out doesn't race seven logins.
    // An authentication failure fails the whole batch; there is nothing
    // partial to show without a session.
    controller.login().await?;

    let (devices, clients, wlans, nets, ports, rates, info) = tokio::join!(
        controller.devices(),
        controller.clients(),
        controller.wireless_networks(),
        controller.network_configs(),
        controller.port_forwards(),
        controller.network_rates(),
        controller.system_info(),
    );

    let mut failures = Vec::new();
    let mut result = AggregateResult {
        devices: settle("devices", devices, &mut failures).unwrap_or_default(),
        clients: settle("clients", clients, &mut failures).unwrap_or_default(),
        network: settle("network_rates", rates, &mut failures).flatten(),
        system: SystemSnapshot {
            info: settle("system_info", info, &mut failures).flatten(),
            wifi_networks: settle("wireless_networks", wlans, &mut failures),
            dhcp: settle("network_configs", nets, &mut failures),
            port_forwarding: settle("port_forwards", ports, &mut failures),
        },
        failures,
    };

    // If the session lapsed mid-batch and recovery failed, the data
    // already fetched may predate the lapse. The sensitive parts are
    // withheld rather than shown on a dead session.
    if controller.mode() == ConnectionMode::Local && !controller.session().is_authenticated() {
        warn!("session lapsed during collection; withholding sensitive resources");
        result.system.dhcp = None;
        result.system.port_forwarding = None;
    }

    Ok(result)
}
