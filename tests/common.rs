#![allow(dead_code)]
use chrono::{DateTime, Utc};
use ingest_ring::domains::ring::interfaces::{DescriptorDecoder, UpdateCallback};
use ingest_ring::domains::ring::QuitSignal;
use ingest_ring::prelude::*;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// Builds a ring where every node holds the given hashes in one state.
pub fn ring(nodes: &[(&str, &[u32], TokenState)]) -> RingDescriptor {
    ring_at(nodes, Utc::now())
}

pub fn ring_at(nodes: &[(&str, &[u32], TokenState)], heartbeat: DateTime<Utc>) -> RingDescriptor {
    let mut desc = RingDescriptor::default();
    for (id, hashes, state) in nodes {
        desc.add_node(*id, format!("{id}:9095"), hashes.iter().copied(), *state, heartbeat);
    }
    desc
}

pub fn ids(replicas: &[NodeInfo]) -> Vec<&str> {
    replicas.iter().map(|node| node.id.as_str()).collect()
}

pub async fn wait_until(engine: &RingEngine, mut ready: impl FnMut(&RingDescriptor) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !ready(&*engine.snapshot().unwrap()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("ring did not reach the expected state in time");
}

pub async fn wait_for_tokens(engine: &RingEngine, count: usize) {
    wait_until(engine, |desc| desc.token_count() == count).await
}

/// Hands the engine whatever the test sends, in order.
pub struct ScriptedWatcher(Mutex<mpsc::UnboundedReceiver<Option<RingDescriptor>>>);

impl ScriptedWatcher {
    pub fn new() -> (mpsc::UnboundedSender<Option<RingDescriptor>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self(Mutex::new(rx)))
    }
}

#[async_trait::async_trait]
impl TCoordinationWatcher for ScriptedWatcher {
    async fn watch_key(
        &self,
        _key: &str,
        _decoder: DescriptorDecoder,
        mut quit: QuitSignal,
        on_update: UpdateCallback<'_>,
    ) {
        let mut rx = self.0.lock().await;
        loop {
            tokio::select! {
                _ = quit.recv() => return,
                value = rx.recv() => match value {
                    | Some(value) => {
                        if !on_update(value) {
                            return;
                        }
                    },
                    | None => return quit.recv().await,
                },
            }
        }
    }
}
