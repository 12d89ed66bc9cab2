use super::descriptor::{NodeIdentifier, NodeInfo, RingDescriptor, Token};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Liveness and ownership figures derived from one ring snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RingReport {
    /// Fraction of the hash space owned by each node.
    pub ownership: BTreeMap<NodeIdentifier, f64>,
    pub healthy: usize,
    pub unhealthy: usize,
    pub tokens: usize,
}

impl RingReport {
    pub fn compute(desc: &RingDescriptor, now: DateTime<Utc>, heartbeat_timeout: Duration) -> Self {
        let (healthy, unhealthy) = count_health(desc.nodes().values(), now, heartbeat_timeout);
        Self { ownership: ownership(desc.tokens()), healthy, unhealthy, tokens: desc.token_count() }
    }

    pub fn total_ownership(&self) -> f64 {
        self.ownership.values().sum()
    }
}

/// Each token owns the span up to the next token; the last one wraps through
/// `u32::MAX` back to the first.
pub fn ownership(tokens: &[Token]) -> BTreeMap<NodeIdentifier, f64> {
    let mut owned: BTreeMap<&NodeIdentifier, u64> = BTreeMap::new();
    for (i, token) in tokens.iter().enumerate() {
        let span = match tokens.get(i + 1) {
            | Some(next) => u64::from(next.hash - token.hash),
            | None => u64::from(u32::MAX - token.hash) + u64::from(tokens[0].hash),
        };
        *owned.entry(&token.node_id).or_default() += span;
    }

    owned
        .into_iter()
        .map(|(id, span)| (id.clone(), span as f64 / f64::from(u32::MAX)))
        .collect()
}

/// Returns `(healthy, unhealthy)`.
pub fn count_health<'a>(
    nodes: impl IntoIterator<Item = &'a NodeInfo>,
    now: DateTime<Utc>,
    heartbeat_timeout: Duration,
) -> (usize, usize) {
    nodes.into_iter().fold((0, 0), |(healthy, unhealthy), node| {
        if node.is_healthy_at(now, heartbeat_timeout) {
            (healthy + 1, unhealthy)
        } else {
            (healthy, unhealthy + 1)
        }
    })
}
