//! Logging and metrics export for the ring.
pub mod metrics;
pub mod tracing;

pub use self::metrics::{MetricsState, RingMetrics, init_metrics, scrape};
pub use self::tracing::init_tracing;
