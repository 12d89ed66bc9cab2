use super::error::RingError;
use crate::{from_to, make_smart_pointer};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

pub(crate) const SERDE_CONFIG: bincode::config::Configuration = bincode::config::standard();

#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Default, bincode::Encode, bincode::Decode,
)]
pub struct NodeIdentifier(pub String);

make_smart_pointer!(NodeIdentifier, String);
from_to!(String, NodeIdentifier);

impl From<&str> for NodeIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a token. Only `Leaving` changes how replicas are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, bincode::Encode, bincode::Decode)]
pub enum TokenState {
    #[default]
    Active,
    Leaving,
    Pending,
    Joining,
}

/// One position on the ring, owned by a node.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Token {
    pub hash: u32,
    pub node_id: NodeIdentifier,
    pub state: TokenState,
}

impl Token {
    pub fn new(hash: u32, node_id: impl Into<NodeIdentifier>, state: TokenState) -> Self {
        Self { hash, node_id: node_id.into(), state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct NodeInfo {
    pub id: NodeIdentifier,
    pub addr: String,
    // unix millis, written by the node itself
    pub last_heartbeat: i64,
}

impl NodeInfo {
    pub fn new(
        id: impl Into<NodeIdentifier>,
        addr: impl Into<String>,
        last_heartbeat: DateTime<Utc>,
    ) -> Self {
        Self { id: id.into(), addr: addr.into(), last_heartbeat: last_heartbeat.timestamp_millis() }
    }

    pub fn last_heartbeat(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_heartbeat).unwrap_or_default()
    }

    /// A node is healthy while its last heartbeat is at most `timeout` old.
    pub fn is_healthy_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let elapsed = now.timestamp_millis().saturating_sub(self.last_heartbeat);
        elapsed <= i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = now.timestamp_millis();
    }
}

/// Point-in-time snapshot of cluster membership.
///
/// Tokens are kept sorted ascending by hash with no duplicate hashes. When two
/// tokens share a hash, the one that was present first wins.
#[derive(Debug, Clone, PartialEq, Default, bincode::Encode, bincode::Decode)]
pub struct RingDescriptor {
    nodes: BTreeMap<NodeIdentifier, NodeInfo>,
    tokens: Vec<Token>,
}

impl RingDescriptor {
    pub fn new(
        nodes: impl IntoIterator<Item = NodeInfo>,
        tokens: impl IntoIterator<Item = Token>,
    ) -> Self {
        let mut desc = Self {
            nodes: nodes.into_iter().map(|node| (node.id.clone(), node)).collect(),
            tokens: tokens.into_iter().collect(),
        };
        desc.normalize();
        desc
    }

    fn normalize(&mut self) {
        self.tokens.sort_by_key(|token| token.hash);
        self.tokens.dedup_by_key(|token| token.hash);
    }

    /// Registers a node with the given token hashes, replacing any tokens it owned before.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeIdentifier>,
        addr: impl Into<String>,
        hashes: impl IntoIterator<Item = u32>,
        state: TokenState,
        heartbeat: DateTime<Utc>,
    ) {
        let node = NodeInfo::new(id, addr, heartbeat);
        self.tokens.retain(|token| token.node_id != node.id);
        self.tokens.extend(hashes.into_iter().map(|hash| Token::new(hash, node.id.clone(), state)));
        self.nodes.insert(node.id.clone(), node);
        self.normalize();
    }

    /// Moves every token of `id` into `state`. Returns false if the node owns no tokens.
    pub fn set_state(&mut self, id: &NodeIdentifier, state: TokenState) -> bool {
        let mut changed = false;
        for token in self.tokens.iter_mut().filter(|token| &token.node_id == id) {
            token.state = state;
            changed = true;
        }
        changed
    }

    pub fn heartbeat(&mut self, id: &NodeIdentifier, now: DateTime<Utc>) -> bool {
        match self.nodes.get_mut(id) {
            | Some(node) => {
                node.heartbeat(now);
                true
            },
            | None => false,
        }
    }

    pub fn remove_node(&mut self, id: &NodeIdentifier) -> Option<NodeInfo> {
        self.tokens.retain(|token| &token.node_id != id);
        self.nodes.remove(id)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn nodes(&self) -> &BTreeMap<NodeIdentifier, NodeInfo> {
        &self.nodes
    }

    pub fn node(&self, id: &NodeIdentifier) -> Option<&NodeInfo> {
        self.nodes.get(id)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn encode(&self) -> Result<Bytes, RingError> {
        bincode::encode_to_vec(self, SERDE_CONFIG)
            .map(Bytes::from)
            .map_err(|e| RingError::Encode(e.to_string()))
    }
}

/// Decodes a descriptor as published to the coordination store.
///
/// Token order is re-established after decoding, so a publisher that wrote an
/// unsorted token list still yields a valid ring.
pub fn decode_descriptor(bytes: &[u8]) -> Result<RingDescriptor, RingError> {
    let (mut desc, _): (RingDescriptor, usize) = bincode::decode_from_slice(bytes, SERDE_CONFIG)
        .map_err(|e| RingError::Decode(e.to_string()))?;
    desc.normalize();
    Ok(desc)
}
