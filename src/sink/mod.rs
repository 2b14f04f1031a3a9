// Remote flush sink: validate-then-send contract and the CloudWatch binding.

mod cloudwatch;

pub use cloudwatch::CloudWatchSink;

use async_trait::async_trait;

use crate::aggregation::FlushBatch;
use crate::error::Result;
use crate::models::MetricDatum;

#[async_trait]
pub trait MetricSink: Send + Sync {
    /// One transport call. Callers validate `data` first.
    async fn put_metric_data(&self, namespace: &str, data: Vec<MetricDatum>) -> Result<()>;

    /// Validates every record of the batch, then sends it request by request.
    /// Nothing is sent if any record is invalid.
    async fn send_batch(&self, namespace: &str, batch: FlushBatch) -> Result<()> {
        let requests = batch.into_requests();
        for datum in requests.iter().flatten() {
            datum.validate()?;
        }
        for data in requests {
            self.put_metric_data(namespace, data).await?;
        }
        Ok(())
    }
}
