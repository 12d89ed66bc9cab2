use super::descriptor::{NodeInfo, RingDescriptor, decode_descriptor};
use super::error::RingError;
use super::interfaces::{QuitSignal, QuitTrigger, TCoordinationWatcher};
use super::replicas::{Operation, resolve_replicas};
use super::report::RingReport;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Key under which the ring descriptor lives in the coordination store.
pub const RING_KEY: &str = "ring";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    pub heartbeat_timeout: Duration,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self { heartbeat_timeout: Duration::from_secs(60) }
    }
}

type SharedSnapshot = Arc<RwLock<Arc<RingDescriptor>>>;

/// Consistent hash ring kept in sync with the coordination store.
///
/// A single background task installs every descriptor the watcher delivers;
/// queries run on the caller's task against whichever snapshot is current.
/// Snapshots are swapped whole, so a query never mixes two versions.
#[derive(Debug)]
pub struct RingEngine {
    snapshot: SharedSnapshot,
    heartbeat_timeout: Duration,
    watch_loop: Mutex<Option<WatchLoop>>,
    stopped: AtomicBool,
}

#[derive(Debug)]
struct WatchLoop {
    quit: QuitTrigger,
    done: JoinHandle<()>,
}

impl RingEngine {
    /// Starts watching [`RING_KEY`] on the current tokio runtime.
    #[instrument(skip(watcher))]
    pub fn run(watcher: impl TCoordinationWatcher, config: RingConfig) -> Self {
        let snapshot = SharedSnapshot::default();
        let (quit, signal) = QuitSignal::pair();
        let done = tokio::spawn(Self::watch(watcher, snapshot.clone(), signal));

        Self {
            snapshot,
            heartbeat_timeout: config.heartbeat_timeout,
            watch_loop: Mutex::new(Some(WatchLoop { quit, done })),
            stopped: AtomicBool::new(false),
        }
    }

    async fn watch(watcher: impl TCoordinationWatcher, snapshot: SharedSnapshot, quit: QuitSignal) {
        let mut on_update = |value: Option<RingDescriptor>| {
            let Some(desc) = value else {
                info!("Ring doesn't exist in the coordination store yet");
                return true;
            };
            debug!(tokens = desc.token_count(), nodes = desc.nodes().len(), "installing ring");

            let desc = Arc::new(desc);
            let mut guard = snapshot.write().unwrap_or_else(PoisonError::into_inner);
            let previous = std::mem::replace(&mut *guard, desc);
            drop(guard);
            // the old ring may be the last reference; free it outside the lock
            drop(previous);
            true
        };

        watcher.watch_key(RING_KEY, decode_descriptor, quit, &mut on_update).await;
        info!("ring watch loop exited");
    }

    fn current(&self) -> Result<RwLockReadGuard<'_, Arc<RingDescriptor>>, RingError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(RingError::Stopped);
        }
        Ok(self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the replicas for `key`, `n` or more when leaving nodes are met.
    pub fn get(&self, key: u32, n: usize, op: Operation) -> Result<Vec<NodeInfo>, RingError> {
        let desc = self.current()?;
        resolve_replicas(&desc, key, n, op)
    }

    /// Resolves every key against the same snapshot. The result follows input order.
    pub fn batch_get(
        &self,
        keys: &[u32],
        n: usize,
        op: Operation,
    ) -> Result<Vec<Vec<NodeInfo>>, RingError> {
        let desc = self.current()?;
        keys.iter().map(|key| resolve_replicas(&desc, *key, n, op)).collect()
    }

    pub fn get_all_healthy(&self) -> Result<Vec<NodeInfo>, RingError> {
        self.get_all_healthy_at(Utc::now())
    }

    pub fn get_all_healthy_at(&self, now: DateTime<Utc>) -> Result<Vec<NodeInfo>, RingError> {
        let desc = self.current()?;
        Ok(desc
            .nodes()
            .values()
            .filter(|node| node.is_healthy_at(now, self.heartbeat_timeout))
            .cloned()
            .collect())
    }

    /// Every registered node, regardless of heartbeat age.
    pub fn get_all(&self) -> Result<Vec<NodeInfo>, RingError> {
        Ok(self.current()?.nodes().values().cloned().collect())
    }

    pub fn snapshot(&self) -> Result<Arc<RingDescriptor>, RingError> {
        Ok(Arc::clone(&*self.current()?))
    }

    pub fn report(&self) -> Result<RingReport, RingError> {
        self.report_at(Utc::now())
    }

    pub fn report_at(&self, now: DateTime<Utc>) -> Result<RingReport, RingError> {
        let desc = self.current()?;
        Ok(RingReport::compute(&desc, now, self.heartbeat_timeout))
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    /// Stops the watch loop and waits for it to exit.
    ///
    /// Returns `false` if the engine was already stopped. Queries issued
    /// afterwards fail with [`RingError::Stopped`].
    #[instrument(skip(self))]
    pub async fn stop(&self) -> bool {
        let watch_loop = self.watch_loop.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(WatchLoop { quit, done }) = watch_loop else {
            warn!("ring engine already stopped");
            return false;
        };

        self.stopped.store(true, Ordering::Release);
        quit.fire();
        if let Err(err) = done.await {
            error!(%err, "ring watch loop did not exit cleanly");
        }
        true
    }
}
