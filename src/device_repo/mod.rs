// Device snapshot provider: trait seam plus the NVML-backed implementation.

mod nvml;

pub use nvml::NvmlProvider;

use std::sync::Arc;

use crate::error::{ExporterError, Result};
use crate::models::DeviceSnapshot;

/// Synchronous source of device snapshots, shared read-only by both pipelines.
///
/// Implementations must return every visible device exactly once per call, in
/// a stable order.
pub trait DeviceProvider: Send + Sync {
    fn get_devices(&self) -> Result<Vec<DeviceSnapshot>>;
}

/// Runs the blocking device query off the async runtime.
pub async fn fetch_devices(provider: Arc<dyn DeviceProvider>) -> Result<Vec<DeviceSnapshot>> {
    tokio::task::spawn_blocking(move || provider.get_devices())
        .await
        .map_err(|e| ExporterError::Provider(format!("device query task join: {}", e)))?
}
