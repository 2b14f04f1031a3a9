// Worker tests: gauge publisher and aggregation loop against fake provider and sink

mod common;

use common::{FakeProvider, RecordingSink, device};
use gpu_telemetry_exporter::aggregation::{FlushBatch, Resolution, Window, build_samples_now};
use gpu_telemetry_exporter::aggregation_worker::{self, AggregationWorkerConfig, AggregationWorkerDeps};
use gpu_telemetry_exporter::error::ExporterError;
use gpu_telemetry_exporter::flush::FlushDispatcher;
use gpu_telemetry_exporter::gauge_registry::{GPU_MEM_USED, GPU_USAGE, GaugeRegistry};
use gpu_telemetry_exporter::gauge_worker::{self, GaugeWorkerConfig, GaugeWorkerDeps};
use gpu_telemetry_exporter::models::DatumValue;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc;

fn aggregation_config(resolution_secs: u64, period_secs: u64) -> AggregationWorkerConfig {
    AggregationWorkerConfig {
        resolution_secs,
        period_secs,
        instance: "i-test".into(),
    }
}

#[tokio::test]
async fn gauge_worker_publishes_device_values() {
    let provider = Arc::new(FakeProvider::with_devices(vec![device("GPU-a", 37, 512, 512)]));
    let gauges = Arc::new(GaugeRegistry::new().unwrap());
    let (fatal_tx, _fatal_rx) = mpsc::channel(4);

    let handle = gauge_worker::spawn(
        GaugeWorkerDeps {
            provider: provider.clone(),
            gauges: gauges.clone(),
            fatal_tx,
        },
        GaugeWorkerConfig {
            poll_interval_secs: 1,
        },
    );

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while gauges.value(GPU_USAGE, "GPU-a", "Tesla T4").is_none() {
        assert!(tokio::time::Instant::now() < deadline, "gauges never set");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(gauges.value(GPU_USAGE, "GPU-a", "Tesla T4"), Some(37.0));
    assert_eq!(
        gauges.value(GPU_MEM_USED, "GPU-a", "Tesla T4"),
        Some((512 * common::MIB) as f64)
    );
    handle.abort();
}

#[tokio::test]
async fn gauge_worker_reports_provider_failure_as_fatal() {
    let provider = Arc::new(FakeProvider::failing());
    let gauges = Arc::new(GaugeRegistry::new().unwrap());
    let (fatal_tx, mut fatal_rx) = mpsc::channel(4);

    let handle = gauge_worker::spawn(
        GaugeWorkerDeps {
            provider,
            gauges,
            fatal_tx,
        },
        GaugeWorkerConfig {
            poll_interval_secs: 1,
        },
    );

    let err = tokio::time::timeout(Duration::from_secs(2), fatal_rx.recv())
        .await
        .expect("fatal error reported")
        .expect("channel open");
    assert!(matches!(err, ExporterError::Provider(_)));
    handle.await.unwrap();
}

#[tokio::test]
async fn aggregation_worker_rejects_bad_resolution_before_running() {
    let provider = Arc::new(FakeProvider::with_devices(vec![device("GPU-a", 1, 1, 1)]));
    let sink = Arc::new(RecordingSink::default());
    let (fatal_tx, _fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink, "test", 2, fatal_tx.clone());

    let result = aggregation_worker::spawn(
        AggregationWorkerDeps {
            provider: provider.clone(),
            dispatcher,
            fatal_tx,
        },
        aggregation_config(30, 60),
    );

    assert!(matches!(result, Err(ExporterError::Config(_))));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn aggregation_worker_pushes_raw_batches_at_one_second_resolution() {
    let provider = Arc::new(FakeProvider::with_devices(vec![device("GPU-a", 42, 1000, 3000)]));
    let sink = Arc::new(RecordingSink::default());
    let (fatal_tx, _fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink.clone(), "nvidia-test", 2, fatal_tx.clone());

    let handle = aggregation_worker::spawn(
        AggregationWorkerDeps {
            provider,
            dispatcher,
            fatal_tx,
        },
        aggregation_config(1, 1),
    )
    .unwrap();

    let requests = sink.wait_for_requests(1, Duration::from_secs(5)).await;
    handle.abort();

    assert!(!requests.is_empty(), "no batch pushed within 5s");
    let (namespace, data) = &requests[0];
    assert_eq!(namespace, "nvidia-test");
    assert_eq!(data.len(), 3);
    assert_eq!(data[0].metric_name, "GPUUtilization");
    assert_eq!(data[0].value, DatumValue::Single(42.0));
    assert_eq!(data[1].value, DatumValue::Single(1000.0));
    assert_eq!(data[2].value, DatumValue::Single(3000.0));
    assert!(data.iter().all(|d| d.storage_resolution == Some(1)));
    assert!(
        data.iter()
            .all(|d| d.dimensions[0].name == "Instance" && d.dimensions[0].value == "i-test")
    );
}

#[tokio::test]
async fn aggregation_worker_stops_on_provider_failure_without_pushing() {
    let provider = Arc::new(FakeProvider::failing());
    let sink = Arc::new(RecordingSink::default());
    let (fatal_tx, mut fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink.clone(), "test", 2, fatal_tx.clone());

    let handle = aggregation_worker::spawn(
        AggregationWorkerDeps {
            provider,
            dispatcher,
            fatal_tx,
        },
        aggregation_config(1, 1),
    )
    .unwrap();

    let err = tokio::time::timeout(Duration::from_secs(2), fatal_rx.recv())
        .await
        .expect("fatal error reported")
        .expect("channel open");
    assert!(matches!(err, ExporterError::Provider(_)));
    handle.await.unwrap();
    assert!(sink.requests().is_empty());
}

#[tokio::test]
async fn dispatcher_isolates_transport_failures() {
    let sink = Arc::new(RecordingSink::failing());
    let (fatal_tx, mut fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink, "test", 1, fatal_tx);
    let stats = dispatcher.stats();

    let mut window = Window::new(Resolution::High);
    window.observe(build_samples_now(
        &[device("GPU-a", 1, 1, 1)],
        "i-test",
        Resolution::High,
    ));
    dispatcher.dispatch(window.take()).await.unwrap();

    assert_eq!(stats.failed.load(Ordering::Relaxed), 1);
    assert_eq!(stats.sent.load(Ordering::Relaxed), 0);
    assert!(fatal_rx.try_recv().is_err());
}

#[tokio::test]
async fn dispatcher_treats_invalid_batch_as_fatal_and_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let (fatal_tx, mut fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink.clone(), "test", 1, fatal_tx);

    // Never-merged accumulators carry no metric name.
    dispatcher
        .dispatch(FlushBatch::Coalesced(Default::default()))
        .await
        .unwrap();

    let err = fatal_rx.try_recv().expect("validation error reported");
    assert!(matches!(err, ExporterError::Validation { .. }));
    assert!(sink.requests().is_empty());
}

#[tokio::test]
async fn dispatcher_sends_raw_batch_one_request_per_cycle() {
    let sink = Arc::new(RecordingSink::default());
    let (fatal_tx, _fatal_rx) = mpsc::channel(4);
    let dispatcher = FlushDispatcher::new(sink.clone(), "test", 1, fatal_tx);
    let stats = dispatcher.stats();

    let mut window = Window::new(Resolution::High);
    for u in [10, 20, 30] {
        window.observe(build_samples_now(
            &[device("GPU-a", u, 1, 1)],
            "i-test",
            Resolution::High,
        ));
    }
    dispatcher.dispatch(window.take()).await.unwrap();

    let requests = sink.requests();
    assert_eq!(requests.len(), 3);
    let first_values: Vec<_> = requests.iter().map(|(_, d)| d[0].value.clone()).collect();
    assert_eq!(
        first_values,
        vec![
            DatumValue::Single(10.0),
            DatumValue::Single(20.0),
            DatumValue::Single(30.0)
        ]
    );
    assert_eq!(stats.sent.load(Ordering::Relaxed), 1);
}
