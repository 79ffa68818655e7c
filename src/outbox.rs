use crate::errors::StoreError;
use crate::models::PendingCompletion;
use crate::remote::ActStore;
use crate::storage::LocalStorage;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const PENDING_KEY: &str = "pendingCompletions";

/// Completion events the remote store has not accepted yet.
pub struct Outbox {
    storage: Arc<LocalStorage>,
    flushing: Mutex<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    pub sent: usize,
    pub remaining: usize,
}

impl Outbox {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self {
            storage,
            flushing: Mutex::new(()),
        }
    }

    pub async fn pending(&self) -> Vec<PendingCompletion> {
        let Some(raw) = self.storage.get_item(PENDING_KEY).await else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(pending) => pending,
            Err(err) => {
                error!("dropping malformed {PENDING_KEY} queue: {err}");
                Vec::new()
            }
        }
    }

    /// Writes the event to local storage before any delivery attempt, so it
    /// survives a shutdown in the middle of the remote write.
    pub async fn enqueue(&self, act_id: &str) -> Result<PendingCompletion, StoreError> {
        let _guard = self.flushing.lock().await;
        let entry = PendingCompletion {
            act_id: act_id.to_string(),
            queued_at: Local::now().to_rfc3339(),
        };
        let mut pending = self.pending().await;
        pending.push(entry.clone());
        self.write(&pending).await?;
        Ok(entry)
    }

    /// Sends one queued event and drops it from the queue once the remote
    /// store accepted it. Returns whether it went out. An entry a flush
    /// already delivered is not sent again.
    pub async fn deliver(
        &self,
        remote: &dyn ActStore,
        entry: &PendingCompletion,
    ) -> Result<bool, StoreError> {
        let _guard = self.flushing.lock().await;
        let mut pending = self.pending().await;
        let Some(position) = pending.iter().position(|queued| queued == entry) else {
            return Ok(false);
        };

        match remote.record_completion(&entry.act_id).await {
            Ok(()) => {
                pending.remove(position);
                self.write(&pending).await?;
                info!(act_id = %entry.act_id, "completion recorded remotely");
                Ok(true)
            }
            Err(err) => {
                warn!(act_id = %entry.act_id, "completion write failed, kept for retry: {err}");
                Ok(false)
            }
        }
    }

    /// Sends every queued event once. Events that fail again stay queued.
    pub async fn flush(&self, remote: &dyn ActStore) -> Result<FlushReport, StoreError> {
        let _guard = self.flushing.lock().await;
        let pending = self.pending().await;
        if pending.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut remaining = Vec::new();
        let mut sent = 0;
        for entry in pending {
            match remote.record_completion(&entry.act_id).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    warn!(act_id = %entry.act_id, "completion still not delivered: {err}");
                    remaining.push(entry);
                }
            }
        }

        self.write(&remaining).await?;
        info!(sent, remaining = remaining.len(), "outbox flushed");
        Ok(FlushReport {
            sent,
            remaining: remaining.len(),
        })
    }

    async fn write(&self, pending: &[PendingCompletion]) -> Result<(), StoreError> {
        if pending.is_empty() {
            return self.storage.remove_item(PENDING_KEY).await;
        }
        let raw = serde_json::to_string(pending)?;
        self.storage.set_item(PENDING_KEY, raw).await
    }
}

/// Queues a completion and sends it in the background. The queue write
/// happens before this returns; only the remote write is detached.
pub async fn dispatch_completion(remote: Arc<dyn ActStore>, outbox: Arc<Outbox>, act_id: &str) {
    match outbox.enqueue(act_id).await {
        Ok(entry) => {
            tokio::spawn(async move {
                if let Err(err) = outbox.deliver(remote.as_ref(), &entry).await {
                    error!(act_id = %entry.act_id, "failed to update completion outbox: {err}");
                }
            });
        }
        Err(err) => {
            error!(act_id, "failed to queue completion, sending without retry: {err}");
            let act_id = act_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = remote.record_completion(&act_id).await {
                    warn!(act_id = %act_id, "completion write failed and was not queued: {err}");
                }
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::{FetchError, WriteError};
    use crate::models::Act;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Remote store fake that rejects writes for the listed act ids.
    #[derive(Default)]
    pub(crate) struct FakeRemote {
        pub acts: Vec<Act>,
        pub rejecting: std::sync::Mutex<HashSet<String>>,
        pub written: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActStore for FakeRemote {
        async fn fetch_acts(&self) -> Result<Vec<Act>, FetchError> {
            Ok(self.acts.clone())
        }

        async fn record_completion(&self, act_id: &str) -> Result<(), WriteError> {
            if self.rejecting.lock().unwrap().contains(act_id) {
                return Err(WriteError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            self.written.lock().unwrap().push(act_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_delivery_stays_queued_until_flushed() {
        let outbox = Outbox::new(Arc::new(LocalStorage::in_memory()));
        let remote = FakeRemote::default();
        remote.rejecting.lock().unwrap().insert("a".into());

        let a = outbox.enqueue("a").await.unwrap();
        let b = outbox.enqueue("b").await.unwrap();
        assert_eq!(outbox.pending().await.len(), 2);

        assert!(!outbox.deliver(&remote, &a).await.unwrap());
        assert!(outbox.deliver(&remote, &b).await.unwrap());

        let pending = outbox.pending().await;
        assert_eq!(pending, vec![a.clone()]);
        assert_eq!(*remote.written.lock().unwrap(), vec!["b".to_string()]);

        let report = outbox.flush(&remote).await.unwrap();
        assert_eq!(report, FlushReport { sent: 0, remaining: 1 });

        remote.rejecting.lock().unwrap().clear();
        let report = outbox.flush(&remote).await.unwrap();
        assert_eq!(report, FlushReport { sent: 1, remaining: 0 });
        assert!(outbox.pending().await.is_empty());
        assert_eq!(remote.written.lock().unwrap().last().map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn entry_is_queued_before_delivery() {
        let outbox = Outbox::new(Arc::new(LocalStorage::in_memory()));
        let entry = outbox.enqueue("c").await.unwrap();
        assert_eq!(outbox.pending().await, vec![entry]);
    }

    #[tokio::test]
    async fn flushed_entry_is_not_delivered_twice() {
        let outbox = Outbox::new(Arc::new(LocalStorage::in_memory()));
        let remote = FakeRemote::default();
        let entry = outbox.enqueue("d").await.unwrap();

        outbox.flush(&remote).await.unwrap();
        assert!(!outbox.deliver(&remote, &entry).await.unwrap());
        assert_eq!(*remote.written.lock().unwrap(), vec!["d".to_string()]);
    }

    #[tokio::test]
    async fn empty_outbox_flush_does_nothing() {
        let outbox = Outbox::new(Arc::new(LocalStorage::in_memory()));
        let remote = FakeRemote::default();
        assert_eq!(outbox.flush(&remote).await.unwrap(), FlushReport::default());
        assert!(remote.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_queue_is_dropped() {
        let storage = Arc::new(LocalStorage::in_memory());
        storage.set_item(PENDING_KEY, "oops").await.unwrap();
        let outbox = Outbox::new(storage);
        assert!(outbox.pending().await.is_empty());
        outbox.enqueue("c").await.unwrap();
        assert_eq!(outbox.pending().await.len(), 1);
    }
}
