// Window accumulator: distinct values and their counts for one metric.

use chrono::{DateTime, Utc};

use super::{Dimension, MeasurementRecord, MetricName, StandardUnit};

/// Accumulation target for one metric across a window.
///
/// `values` holds each distinct observed value once, in first-seen order;
/// `counts[i]` is how many merged records carried `values[i]`. Values are
/// compared with exact `f64` equality.
///
/// Metadata fields are `None` until the first merge and then track the most
/// recently merged record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRecord {
    pub name: Option<MetricName>,
    pub dimensions: Vec<Dimension>,
    pub unit: Option<StandardUnit>,
    pub timestamp: Option<DateTime<Utc>>,
    pub storage_resolution: Option<i32>,
    pub values: Vec<f64>,
    pub counts: Vec<f64>,
}

impl AggregatedRecord {
    /// Merges one measurement: metadata is overwritten, the value is counted.
    pub fn merge(&mut self, record: &MeasurementRecord) {
        self.name = Some(record.name);
        self.dimensions = record.dimensions.clone();
        self.unit = Some(record.unit);
        self.timestamp = Some(record.timestamp);
        self.storage_resolution = Some(record.storage_resolution);

        match self.values.iter().position(|v| *v == record.value) {
            Some(i) => self.counts[i] += 1.0,
            None => {
                self.values.push(record.value);
                self.counts.push(1.0);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of measurements merged since the last reset.
    pub fn sample_count(&self) -> f64 {
        self.counts.iter().sum()
    }
}
