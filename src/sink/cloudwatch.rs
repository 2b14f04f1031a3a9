// CloudWatch PutMetricData via aws-sdk-cloudwatch

use async_trait::async_trait;
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types;
use tracing::debug;

use super::MetricSink;
use crate::error::{ExporterError, Result};
use crate::models::{DatumValue, MetricDatum, StandardUnit};

pub struct CloudWatchSink {
    client: Client,
}

impl CloudWatchSink {
    /// Loads credentials from the default provider chain for `region`.
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }
}

#[async_trait]
impl MetricSink for CloudWatchSink {
    async fn put_metric_data(&self, namespace: &str, data: Vec<MetricDatum>) -> Result<()> {
        let count = data.len();
        let metric_data = data.iter().map(to_cloudwatch).collect::<Vec<_>>();

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(metric_data))
            .send()
            .await
            .map_err(|e| ExporterError::Transport {
                namespace: namespace.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            operation = "put_metric_data",
            namespace,
            data_count = count,
            "metric data sent"
        );
        Ok(())
    }
}

/// Maps a validated datum onto the SDK type. Single values land on `value`,
/// distributions on `values`/`counts`.
fn to_cloudwatch(datum: &MetricDatum) -> types::MetricDatum {
    let dimensions = datum
        .dimensions
        .iter()
        .map(|d| {
            types::Dimension::builder()
                .name(&d.name)
                .value(&d.value)
                .build()
        })
        .collect::<Vec<_>>();

    let builder = types::MetricDatum::builder()
        .metric_name(&datum.metric_name)
        .set_dimensions(Some(dimensions))
        .set_unit(datum.unit.map(unit))
        .set_timestamp(
            datum
                .timestamp
                .map(|t| AwsDateTime::from_millis(t.timestamp_millis())),
        )
        .set_storage_resolution(datum.storage_resolution);

    match &datum.value {
        DatumValue::Single(v) => builder.value(*v),
        DatumValue::Distribution { values, counts } => builder
            .set_values(Some(values.clone()))
            .set_counts(Some(counts.clone())),
    }
    .build()
}

fn unit(u: StandardUnit) -> types::StandardUnit {
    match u {
        StandardUnit::Percent => types::StandardUnit::Percent,
        StandardUnit::Megabytes => types::StandardUnit::Megabytes,
    }
}
