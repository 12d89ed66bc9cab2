use super::descriptor::RingDescriptor;
use super::error::RingError;
use tokio::sync::broadcast;

/// Turns the raw value stored under a key into a descriptor.
pub type DescriptorDecoder = fn(&[u8]) -> Result<RingDescriptor, RingError>;

/// Invoked with `None` while the key does not exist, and with the decoded
/// descriptor on every observed change. Returning `false` ends the watch.
pub type UpdateCallback<'a> = &'a mut (dyn FnMut(Option<RingDescriptor>) -> bool + Send);

/// Source of ring descriptor updates, typically backed by a coordination store.
#[async_trait::async_trait]
pub trait TCoordinationWatcher: Send + Sync + 'static {
    /// Watches `key` until `quit` fires or `on_update` asks to stop.
    ///
    /// Retrying after store failures is the implementor's job. The caller only
    /// ever sees `None` or successfully decoded descriptors.
    async fn watch_key(
        &self,
        key: &str,
        decoder: DescriptorDecoder,
        quit: QuitSignal,
        on_update: UpdateCallback<'_>,
    );
}

/// Fires the paired [`QuitSignal`]s. Consumed on use, so it fires at most once.
#[derive(Debug)]
pub struct QuitTrigger(broadcast::Sender<()>);

impl QuitTrigger {
    pub fn fire(self) {
        let _ = self.0.send(());
    }
}

/// One-shot broadcast stop signal handed to a watcher.
///
/// Resolves when the trigger fires or is dropped, so a watcher cannot outlive
/// the engine that started it.
#[derive(Debug)]
pub struct QuitSignal(broadcast::Receiver<()>);

impl QuitSignal {
    pub fn pair() -> (QuitTrigger, QuitSignal) {
        let (tx, rx) = broadcast::channel(1);
        (QuitTrigger(tx), QuitSignal(rx))
    }

    pub async fn recv(&mut self) {
        let _ = self.0.recv().await;
    }

    pub fn has_fired(&mut self) -> bool {
        !matches!(self.0.try_recv(), Err(broadcast::error::TryRecvError::Empty))
    }
}

impl Clone for QuitSignal {
    fn clone(&self) -> Self {
        Self(self.0.resubscribe())
    }
}
