// Resolution and wall-clock tick/flush timing.
// All arithmetic is on second-truncated wall-clock time, so clock adjustments
// shift both the tick grid and flush eligibility.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::error::{ExporterError, Result};
use crate::models::MAX_DISTINCT_VALUES;

/// Storage resolution of one aggregated sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 1 s: raw per-cycle batches.
    High,
    /// 60 s: coalesced distinct-value windows.
    Standard,
}

impl Resolution {
    pub fn from_secs(secs: u64) -> Result<Self> {
        match secs {
            1 => Ok(Resolution::High),
            60 => Ok(Resolution::Standard),
            other => Err(ExporterError::Config(format!(
                "resolution must be 1 or 60, got {}",
                other
            ))),
        }
    }

    pub fn as_secs(self) -> u64 {
        match self {
            Resolution::High => 1,
            Resolution::Standard => 60,
        }
    }

    /// Value carried on the wire as the record's storage resolution.
    pub fn storage_resolution(self) -> i32 {
        self.as_secs() as i32
    }
}

/// Checks a resolution/period pair before any window is opened.
/// A coalescing window may see `ceil(period / 60) + 1` cycles, each of which
/// can add a distinct value, so the period is capped to keep every
/// distribution within `MAX_DISTINCT_VALUES`.
pub fn validate_window(resolution_secs: u64, period_secs: u64) -> Result<Resolution> {
    let resolution = Resolution::from_secs(resolution_secs)?;
    if period_secs < resolution.as_secs() {
        return Err(ExporterError::Config(format!(
            "period must be greater than or equal to resolution ({} < {})",
            period_secs,
            resolution.as_secs()
        )));
    }
    if resolution == Resolution::Standard {
        let cycles = period_secs.div_ceil(resolution.as_secs()) + 1;
        if cycles > MAX_DISTINCT_VALUES as u64 {
            return Err(ExporterError::Config(format!(
                "period of {}s spans {} cycles at {}s resolution, at most {} fit one window",
                period_secs,
                cycles,
                resolution.as_secs(),
                MAX_DISTINCT_VALUES
            )));
        }
    }
    Ok(resolution)
}

pub fn truncate_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Start of the next cycle: the current second plus one resolution step.
pub fn next_tick(now: DateTime<Utc>, resolution: Resolution) -> DateTime<Utc> {
    truncate_to_second(now) + TimeDelta::seconds(resolution.as_secs() as i64)
}

/// True once at least `period_secs` whole seconds have passed since `last_flush`.
pub fn flush_due(now: DateTime<Utc>, last_flush: DateTime<Utc>, period_secs: u64) -> bool {
    (truncate_to_second(now) - last_flush).num_seconds() >= period_secs as i64
}

/// Time left until `target`, zero if already past.
pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (target - now).to_std().unwrap_or(std::time::Duration::ZERO)
}
