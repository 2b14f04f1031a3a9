// Sink-facing record shape and its pre-send validation.
// Limits follow the PutMetricData contract.

use chrono::{DateTime, Utc};

use super::{AggregatedRecord, Dimension, MeasurementRecord, StandardUnit};
use crate::error::{ExporterError, Result};

pub const MAX_DIMENSIONS: usize = 30;
pub const MAX_DISTINCT_VALUES: usize = 150;

#[derive(Debug, Clone, PartialEq)]
pub enum DatumValue {
    Single(f64),
    Distribution { values: Vec<f64>, counts: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDatum {
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub unit: Option<StandardUnit>,
    pub timestamp: Option<DateTime<Utc>>,
    pub storage_resolution: Option<i32>,
    pub value: DatumValue,
}

impl From<&MeasurementRecord> for MetricDatum {
    fn from(r: &MeasurementRecord) -> Self {
        MetricDatum {
            metric_name: r.name.as_str().to_string(),
            dimensions: r.dimensions.clone(),
            unit: Some(r.unit),
            timestamp: Some(r.timestamp),
            storage_resolution: Some(r.storage_resolution),
            value: DatumValue::Single(r.value),
        }
    }
}

impl From<&AggregatedRecord> for MetricDatum {
    fn from(r: &AggregatedRecord) -> Self {
        MetricDatum {
            metric_name: r.name.map(|n| n.as_str().to_string()).unwrap_or_default(),
            dimensions: r.dimensions.clone(),
            unit: r.unit,
            timestamp: r.timestamp,
            storage_resolution: r.storage_resolution,
            value: DatumValue::Distribution {
                values: r.values.clone(),
                counts: r.counts.clone(),
            },
        }
    }
}

impl MetricDatum {
    /// Checks the record is complete and sendable. Any failure is a programming error upstream.
    pub fn validate(&self) -> Result<()> {
        if self.metric_name.is_empty() {
            return Err(self.invalid("metric name is missing"));
        }
        if self.dimensions.is_empty() || self.dimensions.len() > MAX_DIMENSIONS {
            return Err(self.invalid(format!(
                "expected 1..={} dimensions, got {}",
                MAX_DIMENSIONS,
                self.dimensions.len()
            )));
        }
        if let Some(d) = self
            .dimensions
            .iter()
            .find(|d| d.name.is_empty() || d.value.is_empty())
        {
            return Err(self.invalid(format!(
                "dimension {:?}={:?} has an empty name or value",
                d.name, d.value
            )));
        }
        if self.unit.is_none() {
            return Err(self.invalid("unit is missing"));
        }
        if self.timestamp.is_none() {
            return Err(self.invalid("timestamp is missing"));
        }
        match self.storage_resolution {
            Some(1) | Some(60) => {}
            other => {
                return Err(self.invalid(format!(
                    "storage resolution must be 1 or 60, got {:?}",
                    other
                )));
            }
        }
        match &self.value {
            DatumValue::Single(v) => {
                if !v.is_finite() {
                    return Err(self.invalid(format!("value {} is not finite", v)));
                }
            }
            DatumValue::Distribution { values, counts } => {
                if values.len() != counts.len() {
                    return Err(self.invalid(format!(
                        "{} values but {} counts",
                        values.len(),
                        counts.len()
                    )));
                }
                if values.is_empty() || values.len() > MAX_DISTINCT_VALUES {
                    return Err(self.invalid(format!(
                        "expected 1..={} distinct values, got {}",
                        MAX_DISTINCT_VALUES,
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(self.invalid("distribution contains a non-finite value"));
                }
                if counts.iter().any(|c| !c.is_finite() || *c <= 0.0) {
                    return Err(self.invalid("distribution contains a non-positive count"));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> ExporterError {
        ExporterError::Validation {
            metric: if self.metric_name.is_empty() {
                "<unnamed>".to_string()
            } else {
                self.metric_name.clone()
            },
            reason: reason.into(),
        }
    }
}
