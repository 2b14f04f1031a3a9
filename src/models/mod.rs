// Domain models: device snapshots, measurements, window accumulators, sink records

mod aggregated;
mod datum;
mod device;
mod measurement;

pub use aggregated::AggregatedRecord;
pub use datum::{DatumValue, MAX_DIMENSIONS, MAX_DISTINCT_VALUES, MetricDatum};
pub use device::DeviceSnapshot;
pub use measurement::{Dimension, MeasurementRecord, MetricName, StandardUnit};
