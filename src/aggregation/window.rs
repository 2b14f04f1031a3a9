// Open aggregation window and the batch it turns into at flush time.

use tracing::warn;

use super::Resolution;
use crate::models::{AggregatedRecord, MeasurementRecord, MetricDatum};

/// Accumulator slots in the coalescing window, one per metric of a device.
pub const SLOTS: usize = 3;

/// A closed window, owned by whoever sends it.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushBatch {
    /// 60 s resolution: one accumulator per metric.
    Coalesced([AggregatedRecord; SLOTS]),
    /// 1 s resolution: every cycle's records, oldest first.
    Raw(Vec<Vec<MeasurementRecord>>),
}

impl FlushBatch {
    /// Splits the batch into sink requests: one request for a coalesced window,
    /// one per cycle for a raw window.
    pub fn into_requests(self) -> Vec<Vec<MetricDatum>> {
        match self {
            FlushBatch::Coalesced(slots) => vec![slots.iter().map(MetricDatum::from).collect()],
            FlushBatch::Raw(cycles) => cycles
                .iter()
                .map(|cycle| cycle.iter().map(MetricDatum::from).collect())
                .collect(),
        }
    }

    /// Number of sink-level records in the batch.
    pub fn record_count(&self) -> usize {
        match self {
            FlushBatch::Coalesced(slots) => slots.len(),
            FlushBatch::Raw(cycles) => cycles.iter().map(Vec::len).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    Coalescing {
        slots: [AggregatedRecord; SLOTS],
        extra_records_warned: bool,
    },
    Raw {
        cycles: Vec<Vec<MeasurementRecord>>,
    },
}

impl Window {
    pub fn new(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Standard => Window::Coalescing {
                slots: Default::default(),
                extra_records_warned: false,
            },
            Resolution::High => Window::Raw {
                cycles: Vec::with_capacity(60),
            },
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            Window::Coalescing { .. } => Resolution::Standard,
            Window::Raw { .. } => Resolution::High,
        }
    }

    /// Adds one cycle's records. A cycle with no records (no visible device)
    /// is skipped.
    pub fn observe(&mut self, records: Vec<MeasurementRecord>) {
        if records.is_empty() {
            warn!(operation = "observe", "no device records this cycle; skipped");
            return;
        }
        match self {
            Window::Coalescing {
                slots,
                extra_records_warned,
            } => {
                if records.len() < SLOTS {
                    warn!(
                        operation = "observe",
                        records = records.len(),
                        "incomplete device record set; skipped"
                    );
                    return;
                }
                if records.len() > SLOTS && !*extra_records_warned {
                    warn!(
                        operation = "observe",
                        records = records.len(),
                        "coalescing window tracks the first device only"
                    );
                    *extra_records_warned = true;
                }
                // Record k of every cycle lands in slot k.
                for (slot, record) in slots.iter_mut().zip(records.iter()) {
                    slot.merge(record);
                }
            }
            Window::Raw { cycles } => cycles.push(records),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Window::Coalescing { slots, .. } => slots.iter().all(AggregatedRecord::is_empty),
            Window::Raw { cycles } => cycles.is_empty(),
        }
    }

    /// Closes the window: returns its contents and leaves a fresh empty window in place.
    pub fn take(&mut self) -> FlushBatch {
        let fresh = Window::new(self.resolution());
        let closed = std::mem::replace(self, fresh);
        match closed {
            Window::Coalescing { slots, .. } => FlushBatch::Coalesced(slots),
            Window::Raw { cycles } => FlushBatch::Raw(cycles),
        }
    }
}
