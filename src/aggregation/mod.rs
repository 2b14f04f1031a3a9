// Aggregation core: sample building, windowing and timing. No I/O here;
// the loop that drives it lives in aggregation_worker.

mod aggregator;
pub mod cadence;
mod samples;
mod window;

pub use aggregator::WindowAggregator;
pub use cadence::Resolution;
pub use samples::{GPU_DIMENSION, INSTANCE_DIMENSION, build_samples, build_samples_now};
pub use window::{FlushBatch, SLOTS, Window};
