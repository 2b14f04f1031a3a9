// GPU device snapshot as returned by the device provider

/// One device's identity and instantaneous metrics. Memory is in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub identity: String,
    pub model: String,
    pub total_memory: u64,
    pub used_memory: u64,
    pub free_memory: u64,
    pub utilization_percent: u32,
}
