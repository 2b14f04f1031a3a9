// NVML binding via nvml-wrapper

use nvml_wrapper::Nvml;
use tracing::{debug, info};

use super::DeviceProvider;
use crate::error::{ExporterError, Result};
use crate::models::DeviceSnapshot;

/// Process-wide NVML handle. NVML is initialized on construction and shut
/// down when the last owner drops it.
pub struct NvmlProvider {
    nvml: Nvml,
}

impl NvmlProvider {
    pub fn init() -> Result<Self> {
        let nvml = Nvml::init()?;
        info!("nvml initialized");
        Ok(Self { nvml })
    }
}

impl DeviceProvider for NvmlProvider {
    fn get_devices(&self) -> Result<Vec<DeviceSnapshot>> {
        let count = self.nvml.device_count()?;
        let mut devices = Vec::with_capacity(count as usize);

        for index in 0..count {
            let at = |e: nvml_wrapper::error::NvmlError| {
                ExporterError::Provider(format!("device {}: {}", index, e))
            };
            let device = self.nvml.device_by_index(index).map_err(at)?;
            let memory = device.memory_info().map_err(at)?;
            let utilization = device.utilization_rates().map_err(at)?;

            devices.push(DeviceSnapshot {
                identity: device.uuid().map_err(at)?,
                model: device.name().map_err(at)?,
                total_memory: memory.total,
                used_memory: memory.used,
                free_memory: memory.free,
                utilization_percent: utilization.gpu,
            });
        }

        debug!(device_count = devices.len(), "devices queried");
        Ok(devices)
    }
}

impl Drop for NvmlProvider {
    fn drop(&mut self) {
        // Nvml's own Drop performs the shutdown call.
        info!("nvml shutdown");
    }
}
