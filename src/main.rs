use anyhow::Result;
use clap::Parser;
use gpu_telemetry_exporter::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Enable the CloudWatch push pipeline.
    #[arg(long)]
    cloudwatch_exporter: bool,

    /// Path to the TOML config file.
    #[arg(long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let mut app_config = config::AppConfig::read_file(cli.config.as_deref())?;
    app_config.apply_overrides(|key| std::env::var(key).ok())?;
    if cli.cloudwatch_exporter {
        app_config.cloudwatch.enabled = true;
    }
    app_config.validate()?;

    // Lives until main returns; dropping the last Arc shuts NVML down.
    let provider: Arc<dyn device_repo::DeviceProvider> =
        Arc::new(device_repo::NvmlProvider::init()?);
    let gauges = Arc::new(gauge_registry::GaugeRegistry::new()?);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<error::ExporterError>(8);

    let _gauge_handle = gauge_worker::spawn(
        gauge_worker::GaugeWorkerDeps {
            provider: provider.clone(),
            gauges: gauges.clone(),
            fatal_tx: fatal_tx.clone(),
        },
        gauge_worker::GaugeWorkerConfig {
            poll_interval_secs: app_config.gauges.poll_interval_secs,
        },
    );

    let cw = &app_config.cloudwatch;
    let _aggregation_handle = if cw.enabled {
        tracing::info!(
            region = %cw.region,
            namespace = %cw.namespace,
            resolution_secs = cw.resolution_secs,
            period_secs = cw.period_secs,
            "Starting cloudwatch exporter"
        );
        let instance = instance::resolve_instance_id(
            &cw.metadata_url,
            Duration::from_millis(cw.metadata_timeout_ms),
        )
        .await;
        let sink = Arc::new(sink::CloudWatchSink::connect(&cw.region).await);
        let dispatcher = flush::FlushDispatcher::new(
            sink,
            &cw.namespace,
            cw.max_in_flight_flushes,
            fatal_tx.clone(),
        );
        Some(aggregation_worker::spawn(
            aggregation_worker::AggregationWorkerDeps {
                provider: provider.clone(),
                dispatcher,
                fatal_tx: fatal_tx.clone(),
            },
            aggregation_worker::AggregationWorkerConfig {
                resolution_secs: cw.resolution_secs,
                period_secs: cw.period_secs,
                instance,
            },
        )?)
    } else {
        tracing::info!("cloudwatch exporter disabled");
        None
    };
    drop(fatal_tx);

    let app = routes::app(gauges);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}{}", addr, routes::METRICS_PATH);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        Some(e) = fatal_rx.recv() => {
            tracing::error!(error = %e, "fatal error; exiting");
            return Err(e.into());
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
        }
    }

    Ok(())
}
