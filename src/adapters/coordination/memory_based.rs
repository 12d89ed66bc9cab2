//! An in-memory coordination store adapter.
use crate::domains::ring::descriptor::RingDescriptor;
use crate::domains::ring::error::RingError;
use crate::domains::ring::interfaces::{
    DescriptorDecoder, QuitSignal, TCoordinationWatcher, UpdateCallback,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{trace, warn};

/// Keys map to the latest raw value written under them. Watchers see the
/// current value first and then every later change; rapid successive writes
/// may be coalesced into the last one.
#[derive(Clone, Default, Debug)]
pub struct MemoryCoordinator {
    keys: Arc<Mutex<HashMap<String, watch::Sender<Option<Bytes>>>>>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_key<R>(&self, key: &str, f: impl FnOnce(&watch::Sender<Option<Bytes>>) -> R) -> R {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = keys.entry(key.to_string()).or_insert_with(|| watch::channel(None).0);
        f(sender)
    }

    pub fn publish(&self, key: &str, desc: &RingDescriptor) -> Result<(), RingError> {
        self.publish_raw(key, desc.encode()?);
        Ok(())
    }

    pub fn publish_raw(&self, key: &str, value: Bytes) {
        self.with_key(key, |sender| sender.send_replace(Some(value)));
    }

    pub fn delete(&self, key: &str) {
        self.with_key(key, |sender| sender.send_replace(None));
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.with_key(key, |sender| sender.borrow().clone())
    }

    fn subscribe(&self, key: &str) -> watch::Receiver<Option<Bytes>> {
        self.with_key(key, |sender| sender.subscribe())
    }
}

#[async_trait::async_trait]
impl TCoordinationWatcher for MemoryCoordinator {
    async fn watch_key(
        &self,
        key: &str,
        decoder: DescriptorDecoder,
        mut quit: QuitSignal,
        on_update: UpdateCallback<'_>,
    ) {
        let mut receiver = self.subscribe(key);
        loop {
            let value = receiver.borrow_and_update().clone();
            let update = match value {
                | None => Some(None),
                | Some(bytes) => match decoder(&bytes) {
                    | Ok(desc) => Some(Some(desc)),
                    | Err(err) => {
                        warn!(%err, key, "skipping undecodable value");
                        None
                    },
                },
            };

            if let Some(update) = update {
                if !on_update(update) {
                    return;
                }
            }

            tokio::select! {
                _ = quit.recv() => return,
                changed = receiver.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    trace!(key, "value changed");
                },
            }
        }
    }
}
