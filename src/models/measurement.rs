// Per-tick measurement records produced by the sample builder

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GpuUtilization,
    MemoryUsed,
    MemoryFree,
}

impl MetricName {
    /// Emission order within one device's records.
    pub const ALL: [MetricName; 3] = [
        MetricName::GpuUtilization,
        MetricName::MemoryUsed,
        MetricName::MemoryFree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GpuUtilization => "GPUUtilization",
            MetricName::MemoryUsed => "MemoryUsed",
            MetricName::MemoryFree => "MemoryFree",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardUnit {
    Percent,
    Megabytes,
}

/// Named key/value tag attached to a measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One metric observation for one device at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub name: MetricName,
    pub dimensions: Vec<Dimension>,
    pub unit: StandardUnit,
    pub timestamp: DateTime<Utc>,
    pub storage_resolution: i32,
    pub value: f64,
}
