// Detached flush tasks, bounded by a semaphore on concurrent transport calls.
// Each closed window is moved into its own task; the aggregation loop never waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::aggregation::FlushBatch;
use crate::error::FatalSender;
use crate::sink::MetricSink;

/// Running totals across all flush tasks.
#[derive(Debug, Default)]
pub struct FlushStats {
    pub sent: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Clone)]
pub struct FlushDispatcher {
    sink: Arc<dyn MetricSink>,
    namespace: Arc<str>,
    permits: Arc<Semaphore>,
    fatal_tx: FatalSender,
    stats: Arc<FlushStats>,
}

impl FlushDispatcher {
    pub fn new(
        sink: Arc<dyn MetricSink>,
        namespace: &str,
        max_in_flight: usize,
        fatal_tx: FatalSender,
    ) -> Self {
        Self {
            sink,
            namespace: Arc::from(namespace),
            permits: Arc::new(Semaphore::new(max_in_flight)),
            fatal_tx,
            stats: Arc::new(FlushStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<FlushStats> {
        self.stats.clone()
    }

    /// Spawns a task that owns `batch` and sends it once a permit is free.
    /// Transport failures are logged and counted; any other error is fatal
    /// and goes to the fatal channel.
    pub fn dispatch(&self, batch: FlushBatch) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let Ok(_permit) = this.permits.clone().acquire_owned().await else {
                return;
            };
            let records = batch.record_count();

            match this.sink.send_batch(&this.namespace, batch).await {
                Ok(()) => {
                    this.stats.sent.fetch_add(1, Ordering::Relaxed);
                    debug!(operation = "flush", records, "batch flushed");
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, operation = "flush", "batch rejected");
                    let _ = this.fatal_tx.send(e).await;
                    return;
                }
                Err(e) => {
                    this.stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!(error = %e, operation = "flush", records, "batch push failed");
                }
            }

            info!(
                flushes_sent_total = this.stats.sent.load(Ordering::Relaxed),
                flushes_failed_total = this.stats.failed.load(Ordering::Relaxed),
                "flush stats"
            );
        })
    }
}
