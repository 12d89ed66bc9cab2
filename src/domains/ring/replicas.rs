use super::descriptor::{NodeInfo, RingDescriptor, Token, TokenState};
use super::error::RingError;
use std::collections::HashSet;
use tracing::warn;

/// Kind of request a replica set is resolved for.
///
/// Leaving nodes stay readable while their data migrates, but take no new writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

/// Index of the first token whose hash is strictly greater than `key`,
/// wrapping to 0 when `key` is at or past the last token.
pub fn search(tokens: &[Token], key: u32) -> usize {
    let idx = tokens.partition_point(|token| token.hash <= key);
    if idx >= tokens.len() { 0 } else { idx }
}

/// Walks the ring clockwise from `key` and collects up to `n` distinct nodes.
///
/// Each token is visited at most once. Every Leaving node met on the way raises
/// the target by one; for writes the leaving node itself is left out. When the
/// ring runs out of distinct nodes the partial set is returned as is.
pub fn resolve_replicas(
    desc: &RingDescriptor,
    key: u32,
    mut n: usize,
    op: Operation,
) -> Result<Vec<NodeInfo>, RingError> {
    let tokens = desc.tokens();
    if tokens.is_empty() {
        return Err(RingError::EmptyRing);
    }

    // n is caller input and may exceed the ring by far
    let capacity = n.min(tokens.len());
    let mut replicas = Vec::with_capacity(capacity);
    let mut distinct_hosts = HashSet::with_capacity(capacity);
    let start = search(tokens, key);

    for offset in 0..tokens.len() {
        if replicas.len() >= n {
            break;
        }
        let token = &tokens[(start + offset) % tokens.len()];

        // only the first token of a node counts
        if !distinct_hosts.insert(&token.node_id) {
            continue;
        }

        if token.state == TokenState::Leaving {
            n = n.saturating_add(1);
            if op == Operation::Write {
                continue;
            }
        }

        match desc.node(&token.node_id) {
            | Some(node) => replicas.push(node.clone()),
            | None => warn!(
                node_id = %token.node_id,
                hash = token.hash,
                "token refers to unknown node, skipping"
            ),
        }
    }

    Ok(replicas)
}
