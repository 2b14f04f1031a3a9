// Metric sample builder: device snapshots -> measurement records.

use chrono::{DateTime, Utc};

use super::Resolution;
use crate::models::{Dimension, DeviceSnapshot, MeasurementRecord, MetricName, StandardUnit};

pub const INSTANCE_DIMENSION: &str = "Instance";
pub const GPU_DIMENSION: &str = "GPU";

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Emits three records per device, in device order:
/// GPUUtilization (percent), MemoryUsed and MemoryFree (whole megabytes).
/// Every record shares `now` and the `Instance`/`GPU` dimensions.
///
/// The window aggregator relies on this order being identical across calls.
pub fn build_samples(
    devices: &[DeviceSnapshot],
    instance: &str,
    resolution: Resolution,
    now: DateTime<Utc>,
) -> Vec<MeasurementRecord> {
    let storage_resolution = resolution.storage_resolution();
    let mut records = Vec::with_capacity(devices.len() * MetricName::ALL.len());

    for device in devices {
        let dimensions = vec![
            Dimension::new(INSTANCE_DIMENSION, instance),
            Dimension::new(GPU_DIMENSION, device.identity.as_str()),
        ];

        for name in MetricName::ALL {
            let (unit, value) = match name {
                MetricName::GpuUtilization => {
                    (StandardUnit::Percent, device.utilization_percent as f64)
                }
                MetricName::MemoryUsed => (StandardUnit::Megabytes, mib(device.used_memory)),
                MetricName::MemoryFree => (StandardUnit::Megabytes, mib(device.free_memory)),
            };
            records.push(MeasurementRecord {
                name,
                dimensions: dimensions.clone(),
                unit,
                timestamp: now,
                storage_resolution,
                value,
            });
        }
    }

    records
}

/// Samples stamped with the current wall-clock time.
pub fn build_samples_now(
    devices: &[DeviceSnapshot],
    instance: &str,
    resolution: Resolution,
) -> Vec<MeasurementRecord> {
    build_samples(devices, instance, resolution, Utc::now())
}

fn mib(bytes: u64) -> f64 {
    (bytes / BYTES_PER_MIB) as f64
}
