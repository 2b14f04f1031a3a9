// Error taxonomy shared by both pipelines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExporterError>;

/// Central channel on which background tasks report fatal errors to `main`.
pub type FatalSender = tokio::sync::mpsc::Sender<ExporterError>;

#[derive(Debug, Error)]
pub enum ExporterError {
    /// Device enumeration or query failed. Never retried.
    #[error("device query failed: {0}")]
    Provider(String),

    /// Illegal configuration value; only raised at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A record failed self-consistency checks before transmission.
    #[error("metric {metric} failed validation: {reason}")]
    Validation { metric: String, reason: String },

    /// The remote sink rejected or failed to deliver a batch.
    #[error("push to namespace {namespace} failed: {message}")]
    Transport { namespace: String, message: String },
}

impl ExporterError {
    /// Fatal errors end the process; transport failures are isolated to their flush.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExporterError::Transport { .. })
    }
}

impl From<nvml_wrapper::error::NvmlError> for ExporterError {
    fn from(e: nvml_wrapper::error::NvmlError) -> Self {
        ExporterError::Provider(e.to_string())
    }
}
