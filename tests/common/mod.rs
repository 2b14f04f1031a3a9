// Shared test helpers: scripted device provider and recording sink

#![allow(dead_code)]

use async_trait::async_trait;
use gpu_telemetry_exporter::device_repo::DeviceProvider;
use gpu_telemetry_exporter::error::{ExporterError, Result};
use gpu_telemetry_exporter::models::{DeviceSnapshot, MetricDatum};
use gpu_telemetry_exporter::sink::MetricSink;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

pub fn device(identity: &str, utilization: u32, used_mib: u64, free_mib: u64) -> DeviceSnapshot {
    DeviceSnapshot {
        identity: identity.into(),
        model: "Tesla T4".into(),
        total_memory: (used_mib + free_mib) * MIB,
        used_memory: used_mib * MIB,
        free_memory: free_mib * MIB,
        utilization_percent: utilization,
    }
}

/// Provider returning a fixed device list, or failing once `fail` is set.
#[derive(Default)]
pub struct FakeProvider {
    devices: Mutex<Vec<DeviceSnapshot>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_devices(devices: Vec<DeviceSnapshot>) -> Self {
        Self {
            devices: Mutex::new(devices),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let p = Self::default();
        p.fail.store(true, Ordering::SeqCst);
        p
    }

    pub fn set_devices(&self, devices: Vec<DeviceSnapshot>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for FakeProvider {
    fn get_devices(&self) -> Result<Vec<DeviceSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExporterError::Provider("nvml: driver not loaded".into()));
        }
        Ok(self.devices.lock().unwrap().clone())
    }
}

/// Sink that records every request, or fails transport when `fail` is set.
#[derive(Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<(String, Vec<MetricDatum>)>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        let s = Self::default();
        s.fail.store(true, Ordering::SeqCst);
        s
    }

    pub fn requests(&self) -> Vec<(String, Vec<MetricDatum>)> {
        self.requests.lock().unwrap().clone()
    }

    /// Polls until at least `n` requests arrived or `timeout` passes.
    pub async fn wait_for_requests(
        &self,
        n: usize,
        timeout: Duration,
    ) -> Vec<(String, Vec<MetricDatum>)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let requests = self.requests();
            if requests.len() >= n || tokio::time::Instant::now() >= deadline {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn put_metric_data(&self, namespace: &str, data: Vec<MetricDatum>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExporterError::Transport {
                namespace: namespace.into(),
                message: "connection reset".into(),
            });
        }
        self.requests
            .lock()
            .unwrap()
            .push((namespace.to_string(), data));
        Ok(())
    }
}
