//! A coordination store adapter backed by a local directory.
//!
//! Every key is a file under the directory holding the encoded value. Writers
//! replace the file atomically, and watchers poll it for changes.
use crate::domains::ring::descriptor::RingDescriptor;
use crate::domains::ring::interfaces::{
    DescriptorDecoder, QuitSignal, TCoordinationWatcher, UpdateCallback,
};
use anyhow::Context;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct FileCoordinator {
    dir: PathBuf,
    poll_interval: Duration,
}

impl FileCoordinator {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self { dir: dir.into(), poll_interval }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub async fn publish(&self, key: &str, desc: &RingDescriptor) -> anyhow::Result<()> {
        self.publish_raw(key, &desc.encode()?).await
    }

    pub async fn publish_raw(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let tmp = self.dir.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, self.path_for(key))
            .await
            .with_context(|| format!("Failed to publish key {key}"))?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            | Ok(()) => Ok(()),
            | Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            | Err(err) => Err(err).with_context(|| format!("Failed to delete key {key}")),
        }
    }

    /// Poll period with up to 10% jitter so that several watchers spread out.
    fn next_poll(&self) -> Duration {
        let jitter_ms = (self.poll_interval.as_millis() / 10) as u64;
        self.poll_interval + Duration::from_millis(rand::random_range(0..=jitter_ms))
    }
}

async fn read_value(path: &Path) -> std::io::Result<Option<Bytes>> {
    match tokio::fs::read(path).await {
        | Ok(contents) => Ok(Some(Bytes::from(contents))),
        | Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        | Err(err) => Err(err),
    }
}

#[async_trait::async_trait]
impl TCoordinationWatcher for FileCoordinator {
    async fn watch_key(
        &self,
        key: &str,
        decoder: DescriptorDecoder,
        mut quit: QuitSignal,
        on_update: UpdateCallback<'_>,
    ) {
        let path = self.path_for(key);
        debug!(path = %path.display(), "watching key");

        // outer None: nothing observed yet
        let mut last_seen: Option<Option<Bytes>> = None;
        loop {
            match read_value(&path).await {
                | Ok(current) if last_seen.as_ref() != Some(&current) => {
                    last_seen = Some(current.clone());
                    let update = match current {
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
                },
                | Ok(_) => trace!(key, "unchanged"),
                | Err(err) => warn!(%err, path = %path.display(), "failed to read key, retrying"),
            }

            tokio::select! {
                _ = quit.recv() => return,
                _ = tokio::time::sleep(self.next_poll()) => {},
            }
        }
    }
}
