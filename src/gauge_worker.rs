// Live gauge publisher: poll devices on a fixed interval, overwrite gauges.
// A failed device query is fatal; it is reported on the fatal channel and the loop ends.

use std::sync::Arc;
use tokio::time::{Duration, interval};

use crate::device_repo::{DeviceProvider, fetch_devices};
use crate::error::{FatalSender, Result};
use crate::gauge_registry::GaugeRegistry;

pub struct GaugeWorkerDeps {
    pub provider: Arc<dyn DeviceProvider>,
    pub gauges: Arc<GaugeRegistry>,
    pub fatal_tx: FatalSender,
}

pub struct GaugeWorkerConfig {
    pub poll_interval_secs: u64,
}

pub fn spawn(deps: GaugeWorkerDeps, config: GaugeWorkerConfig) -> tokio::task::JoinHandle<()> {
    let GaugeWorkerDeps {
        provider,
        gauges,
        fatal_tx,
    } = deps;

    tokio::spawn(async move {
        if let Err(e) = run(provider, gauges, config.poll_interval_secs).await {
            tracing::error!(error = %e, operation = "publish_gauges", "gauge publisher stopped");
            let _ = fatal_tx.send(e).await;
        }
    })
}

#[tracing::instrument(level = "debug", skip(provider, gauges))]
async fn run(
    provider: Arc<dyn DeviceProvider>,
    gauges: Arc<GaugeRegistry>,
    poll_interval_secs: u64,
) -> Result<()> {
    let mut tick = interval(Duration::from_secs(poll_interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let devices = fetch_devices(provider.clone()).await?;
        for device in &devices {
            gauges.record(device);
        }
        tracing::trace!(device_count = devices.len(), "gauges updated");
    }
}
