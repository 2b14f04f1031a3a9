use serde::Deserialize;
use std::path::Path;

use crate::aggregation::cadence;
use crate::error::{ExporterError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gauges: GaugesConfig,
    pub cloudwatch: CloudWatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 2112,
            host: "0.0.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GaugesConfig {
    pub poll_interval_secs: u64,
}

impl Default for GaugesConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudWatchConfig {
    /// Push pipeline on/off. The pull endpoint always runs.
    pub enabled: bool,
    pub region: String,
    pub namespace: String,
    /// Seconds between pushes.
    pub period_secs: u64,
    /// Storage resolution of pushed samples: 1 or 60.
    pub resolution_secs: u64,
    /// Upper bound on concurrent PutMetricData calls.
    pub max_in_flight_flushes: usize,
    pub metadata_url: String,
    pub metadata_timeout_ms: u64,
}

impl Default for CloudWatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            region: DEFAULT_REGION.into(),
            namespace: "nvidia-cloudwatch".into(),
            period_secs: 60,
            resolution_secs: 60,
            max_in_flight_flushes: 4,
            metadata_url: "http://169.254.169.254/latest/meta-data/instance-id".into(),
            metadata_timeout_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Reads the TOML file at `path`, or `config.toml` if present, or built-in defaults.
    /// A missing explicit file is an error. No overrides, no validation.
    pub fn read_file(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => toml::from_str(&std::fs::read_to_string(p)?)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                toml::from_str(&std::fs::read_to_string(DEFAULT_CONFIG_FILE)?)?
            }
            None => AppConfig::default(),
        };
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No environment overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `AWS_REGION`, `PERIOD`, `RESOLUTION` and `CLOUDWATCH_EXPORTER` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("AWS_REGION") {
            self.cloudwatch.region = region;
        }
        if let Some(period) = lookup("PERIOD").filter(|v| !v.is_empty()) {
            self.cloudwatch.period_secs = parse_secs("PERIOD", &period)?;
        }
        if let Some(resolution) = lookup("RESOLUTION").filter(|v| !v.is_empty()) {
            self.cloudwatch.resolution_secs = parse_secs("RESOLUTION", &resolution)?;
        }
        if let Some(enabled) = lookup("CLOUDWATCH_EXPORTER") {
            self.cloudwatch.enabled = matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if self.cloudwatch.region.is_empty() {
            self.cloudwatch.region = DEFAULT_REGION.into();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        require(
            self.server.port > 0,
            format!("server.port must be between 1 and 65535, got {}", self.server.port),
        )?;
        require(!self.server.host.is_empty(), "server.host must be non-empty".into())?;
        require(
            self.gauges.poll_interval_secs > 0,
            format!(
                "gauges.poll_interval_secs must be > 0, got {}",
                self.gauges.poll_interval_secs
            ),
        )?;

        // Push settings only matter when the push pipeline runs.
        let cw = &self.cloudwatch;
        if !cw.enabled {
            return Ok(());
        }
        require(!cw.region.is_empty(), "cloudwatch.region must be non-empty".into())?;
        require(
            !cw.namespace.is_empty(),
            "cloudwatch.namespace must be non-empty".into(),
        )?;
        require(
            cw.resolution_secs == 1 || cw.resolution_secs == 60,
            format!(
                "cloudwatch.resolution_secs must be 1 or 60, got {}",
                cw.resolution_secs
            ),
        )?;
        require(
            cw.period_secs >= cw.resolution_secs,
            format!(
                "cloudwatch.period_secs must be >= resolution_secs ({} < {})",
                cw.period_secs, cw.resolution_secs
            ),
        )?;
        cadence::validate_window(cw.resolution_secs, cw.period_secs)
            .map_err(|e| ExporterError::Config(format!("cloudwatch.period_secs: {}", e)))?;
        require(
            cw.max_in_flight_flushes > 0,
            format!(
                "cloudwatch.max_in_flight_flushes must be > 0, got {}",
                cw.max_in_flight_flushes
            ),
        )?;
        require(
            cw.metadata_timeout_ms > 0,
            format!(
                "cloudwatch.metadata_timeout_ms must be > 0, got {}",
                cw.metadata_timeout_ms
            ),
        )?;
        Ok(())
    }
}

fn require(ok: bool, message: String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ExporterError::Config(message))
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        ExporterError::Config(format!(
            "{} must be a whole number of seconds, got {:?}",
            key, raw
        ))
    })
}
