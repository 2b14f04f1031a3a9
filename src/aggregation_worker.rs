// Push pipeline loop: query devices once per resolution step, feed the window
// aggregator, hand closed windows to the flush dispatcher.
// Ticks are aligned to whole wall-clock seconds; see aggregation::cadence.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::aggregation::{WindowAggregator, build_samples_now, cadence};
use crate::device_repo::{DeviceProvider, fetch_devices};
use crate::error::{FatalSender, Result};
use crate::flush::FlushDispatcher;

pub struct AggregationWorkerDeps {
    pub provider: Arc<dyn DeviceProvider>,
    pub dispatcher: FlushDispatcher,
    pub fatal_tx: FatalSender,
}

/// Config for the aggregation worker.
#[derive(Debug, Clone)]
pub struct AggregationWorkerConfig {
    /// 1 or 60.
    pub resolution_secs: u64,
    /// Seconds between flushes; at least `resolution_secs`.
    pub period_secs: u64,
    /// Value of the `Instance` dimension.
    pub instance: String,
}

/// Validates the config and spawns the loop. Config errors are returned
/// before anything runs.
pub fn spawn(
    deps: AggregationWorkerDeps,
    config: AggregationWorkerConfig,
) -> Result<tokio::task::JoinHandle<()>> {
    let aggregator = WindowAggregator::new(config.resolution_secs, config.period_secs, Utc::now())?;
    let AggregationWorkerDeps {
        provider,
        dispatcher,
        fatal_tx,
    } = deps;

    Ok(tokio::spawn(async move {
        if let Err(e) = run(provider, dispatcher, aggregator, config.instance).await {
            tracing::error!(error = %e, operation = "aggregate", "aggregation worker stopped");
            let _ = fatal_tx.send(e).await;
        }
    }))
}

#[instrument(
    skip(provider, dispatcher, aggregator),
    fields(
        resolution_secs = aggregator.resolution().as_secs(),
        period_secs = aggregator.period_secs()
    )
)]
async fn run(
    provider: Arc<dyn DeviceProvider>,
    dispatcher: FlushDispatcher,
    mut aggregator: WindowAggregator,
    instance: String,
) -> Result<()> {
    let resolution = aggregator.resolution();
    info!("aggregation worker started");

    loop {
        let next_tick = cadence::next_tick(Utc::now(), resolution);

        let devices = fetch_devices(provider.clone()).await?;
        let records = build_samples_now(&devices, &instance, resolution);

        if let Some(batch) = aggregator.tick(records, Utc::now()) {
            debug!(
                operation = "flush",
                records = batch.record_count(),
                "window closed"
            );
            dispatcher.dispatch(batch);
        }

        tokio::time::sleep(cadence::until(next_tick, Utc::now())).await;
    }
}
