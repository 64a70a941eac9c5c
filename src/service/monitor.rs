//! Background tasks: one poller per native source plus the sidecar TTL checker

use super::SystemService;
use log::{debug, trace};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vitals_hud_core::{sample, SharedMetricSource, TTL_CHECK_INTERVAL};

/// Everything a monitor task needs, captured at reconfiguration time
pub(crate) struct MonitorTask {
    pub id: String,
    pub render_id: String,
    pub interval: Duration,
    pub source: SharedMetricSource,
    pub token: CancellationToken,
}

/// Poll one native source until its token is cancelled
///
/// The first sample is published unconditionally so a fresh cycle always
/// repaints; later samples only when the payload changed.
pub(crate) async fn run_monitor(service: Arc<SystemService>, task: MonitorTask) {
    if task.token.is_cancelled() {
        return;
    }
    poll_once(&service, &task, true);

    let period = task.interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = task.token.cancelled() => break,
            _ = ticker.tick() => poll_once(&service, &task, false),
        }
    }
    trace!("Monitor for {} stopped", task.id);
}

fn poll_once(service: &SystemService, task: &MonitorTask, force: bool) {
    // Sampling runs without the registry lock
    match sample(&task.source) {
        Ok(payload) => {
            service.publish_native(task, payload, force);
        }
        Err(e) => {
            debug!("Error updating {}: {:#}", task.id, e);
        }
    }
}

/// Flip silent sidecars offline once per `TTL_CHECK_INTERVAL`
pub(crate) async fn run_ttl_checker(service: Arc<SystemService>, token: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + TTL_CHECK_INTERVAL, TTL_CHECK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                service.check_sidecar_ttl();
            }
        }
    }
    trace!("TTL checker stopped");
}
