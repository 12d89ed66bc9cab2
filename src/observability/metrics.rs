//! Prometheus export of ring liveness and ownership.
//!
//! Figures are computed from the current snapshot on every scrape rather than
//! tracked incrementally:
//! - `ring_member_ownership_ratio{member}` - fraction of the hash space owned by a node
//! - `ring_members{state}` - nodes by heartbeat health
//! - `ring_tokens` - tokens in the ring
use crate::domains::ring::{NodeIdentifier, RingEngine, RingError, RingReport};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

pub const OWNERSHIP_RATIO: &str = "ring_member_ownership_ratio";
pub const MEMBERS: &str = "ring_members";
pub const TOKENS: &str = "ring_tokens";

#[derive(Clone)]
pub struct MetricsState {
    pub prometheus_handle: PrometheusHandle,
}

/// Installs the global Prometheus recorder.
pub fn init_metrics() -> Result<MetricsState, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_ring_metrics();
    Ok(MetricsState { prometheus_handle: handle })
}

pub fn describe_ring_metrics() {
    describe_gauge!(OWNERSHIP_RATIO, "The fraction of the hash space owned by each ring member.");
    describe_gauge!(MEMBERS, "Number of members in the ring by heartbeat state.");
    describe_gauge!(TOKENS, "Number of tokens in the ring.");
}

/// Remembers which members were exported so that departed ones drop to zero.
#[derive(Debug, Default)]
pub struct RingMetrics {
    reported: Mutex<BTreeSet<NodeIdentifier>>,
}

impl RingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, report: &RingReport) {
        let mut reported = self.reported.lock().unwrap_or_else(PoisonError::into_inner);

        for gone in reported.iter().filter(|id| !report.ownership.contains_key(*id)) {
            gauge!(OWNERSHIP_RATIO, "member" => gone.to_string()).set(0.0);
        }
        reported.clear();

        for (id, share) in &report.ownership {
            gauge!(OWNERSHIP_RATIO, "member" => id.to_string()).set(*share);
            reported.insert(id.clone());
        }

        gauge!(MEMBERS, "state" => "healthy").set(report.healthy as f64);
        gauge!(MEMBERS, "state" => "unhealthy").set(report.unhealthy as f64);
        gauge!(TOKENS).set(report.tokens as f64);
    }
}

/// Computes a fresh report, records it, and renders the exposition text.
pub fn scrape(
    engine: &RingEngine,
    metrics: &RingMetrics,
    handle: &PrometheusHandle,
) -> Result<(RingReport, String), RingError> {
    let report = engine.report()?;
    metrics.record(&report);
    Ok((report, handle.render()))
}
