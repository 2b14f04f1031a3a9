// Pull-side gauges: per-device memory and utilization, Prometheus text exposition.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::models::DeviceSnapshot;

pub const GPU_MEM_USED: &str = "gpu_mem_used";
pub const GPU_MEM_TOTAL: &str = "gpu_mem_total";
pub const GPU_USAGE: &str = "gpu_usage";

const LABELS: [&str; 2] = ["uuid", "model"];

/// Owned registry with the three device gauge families, labelled by `(uuid, model)`.
/// Setting a gauge for a known label pair overwrites the previous value.
pub struct GaugeRegistry {
    registry: Registry,
    mem_used: GaugeVec,
    mem_total: GaugeVec,
    usage: GaugeVec,
}

impl GaugeRegistry {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let mem_used = GaugeVec::new(
            Opts::new(GPU_MEM_USED, "GPU memory in use, bytes."),
            &LABELS,
        )?;
        let mem_total = GaugeVec::new(
            Opts::new(GPU_MEM_TOTAL, "Total GPU memory, bytes."),
            &LABELS,
        )?;
        let usage = GaugeVec::new(
            Opts::new(GPU_USAGE, "GPU utilization, percent."),
            &LABELS,
        )?;
        registry.register(Box::new(mem_used.clone()))?;
        registry.register(Box::new(mem_total.clone()))?;
        registry.register(Box::new(usage.clone()))?;

        Ok(Self {
            registry,
            mem_used,
            mem_total,
            usage,
        })
    }

    pub fn record(&self, device: &DeviceSnapshot) {
        let labels = [device.identity.as_str(), device.model.as_str()];
        self.mem_used
            .with_label_values(&labels)
            .set(device.used_memory as f64);
        self.mem_total
            .with_label_values(&labels)
            .set(device.total_memory as f64);
        self.usage
            .with_label_values(&labels)
            .set(device.utilization_percent as f64);
    }

    /// Current value of one gauge, if that series exists.
    pub fn value(&self, family: &str, uuid: &str, model: &str) -> Option<f64> {
        self.registry
            .gather()
            .into_iter()
            .find(|mf| mf.get_name() == family)?
            .get_metric()
            .iter()
            .find(|m| {
                let labels = m.get_label();
                labels
                    .iter()
                    .any(|l| l.get_name() == "uuid" && l.get_value() == uuid)
                    && labels
                        .iter()
                        .any(|l| l.get_name() == "model" && l.get_value() == model)
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Text exposition of every registered family.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
