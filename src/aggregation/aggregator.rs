// Window aggregator: one open window plus flush timing.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::cadence::{self, Resolution};
use super::window::{FlushBatch, Window};
use crate::error::Result;
use crate::models::MeasurementRecord;

#[derive(Debug)]
pub struct WindowAggregator {
    resolution: Resolution,
    period_secs: u64,
    window: Window,
    last_flush: DateTime<Utc>,
}

impl WindowAggregator {
    /// Fails on a resolution other than 1 or 60, a period shorter than the
    /// resolution, or a coalescing period too long for one distribution.
    pub fn new(resolution_secs: u64, period_secs: u64, started_at: DateTime<Utc>) -> Result<Self> {
        let resolution = cadence::validate_window(resolution_secs, period_secs)?;
        Ok(Self {
            resolution,
            period_secs,
            window: Window::new(resolution),
            last_flush: cadence::truncate_to_second(started_at),
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn last_flush(&self) -> DateTime<Utc> {
        self.last_flush
    }

    /// Adds one cycle's records, then closes the window if the flush period
    /// has elapsed at `now`. An empty window is reset without producing a batch.
    pub fn tick(
        &mut self,
        records: Vec<MeasurementRecord>,
        now: DateTime<Utc>,
    ) -> Option<FlushBatch> {
        self.window.observe(records);

        if !cadence::flush_due(now, self.last_flush, self.period_secs) {
            return None;
        }
        self.last_flush = cadence::truncate_to_second(now);
        if self.window.is_empty() {
            debug!(operation = "flush", "window empty at flush boundary");
            return None;
        }
        Some(self.window.take())
    }
}
