//! In-memory index of batches.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::types::{BatchHandle, BatchSnapshot, BatchStatus};

/// Finished batches kept for inspection when nothing else is configured.
pub const DEFAULT_RETAINED_BATCHES: usize = 32;

#[derive(Debug, Clone)]
pub struct BatchRegistry {
    batches: Arc<RwLock<HashMap<Uuid, Arc<BatchHandle>>>>,
    retained: usize,
}

impl Default for BatchRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_BATCHES)
    }
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retained` finished batches; running ones are never dropped.
    pub fn with_retention(retained: usize) -> Self {
        Self {
            batches: Arc::default(),
            retained,
        }
    }

    /// Register a new batch of `total` ids, evicting the oldest finished
    /// batches beyond the retention limit.
    pub async fn create(&self, total: usize) -> Arc<BatchHandle> {
        let handle = Arc::new(BatchHandle::new(total));
        let mut batches = self.batches.write().await;

        let mut finished = Vec::new();
        for batch in batches.values() {
            let snapshot = batch.snapshot().await;
            if snapshot.status != BatchStatus::Running {
                finished.push((snapshot.finished_at, snapshot.id));
            }
        }
        if finished.len() > self.retained {
            finished.sort_unstable();
            let excess = finished.len() - self.retained;
            for (_, id) in finished.into_iter().take(excess) {
                batches.remove(&id);
            }
            debug!(evicted = excess, "Evicted finished scrape batches");
        }

        batches.insert(handle.id(), handle.clone());
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<BatchHandle>> {
        self.batches.read().await.get(&id).cloned()
    }

    /// Snapshots of every batch, oldest first.
    pub async fn list(&self) -> Vec<BatchSnapshot> {
        let handles: Vec<Arc<BatchHandle>> = self.batches.read().await.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.snapshot().await);
        }
        snapshots.sort_by_key(|s| s.started_at);
        snapshots
    }

    /// Request cancellation. `None` if the batch is unknown.
    pub async fn cancel(&self, id: Uuid) -> Option<bool> {
        self.get(id).await.map(|handle| handle.cancel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_cancel() {
        let registry = BatchRegistry::new();
        let handle = registry.create(3).await;

        let found = registry.get(handle.id()).await.unwrap();
        assert_eq!(found.id(), handle.id());

        assert_eq!(registry.cancel(handle.id()).await, Some(true));
        assert_eq!(registry.cancel(handle.id()).await, Some(false));
        assert!(handle.is_cancelled());

        assert_eq!(registry.cancel(Uuid::new_v4()).await, None);
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_list() {
        let registry = BatchRegistry::new();
        let first = registry.create(1).await;
        let second = registry.create(2).await;

        let listed = registry.list().await;
        assert_eq!(listed.len(), 2);
        let ids: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
        assert!(ids.contains(&first.id()));
        assert!(ids.contains(&second.id()));
    }

    #[tokio::test]
    async fn test_finished_batches_evicted_beyond_retention() {
        let registry = BatchRegistry::with_retention(1);
        let running = registry.create(1).await;

        let oldest = registry.create(1).await;
        oldest.finish(BatchStatus::Completed).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newest = registry.create(1).await;
        newest.finish(BatchStatus::Cancelled).await;

        let latest = registry.create(1).await;

        assert!(registry.get(oldest.id()).await.is_none());
        assert!(registry.get(newest.id()).await.is_some());
        assert!(registry.get(running.id()).await.is_some());
        assert!(registry.get(latest.id()).await.is_some());
        assert_eq!(registry.list().await.len(), 3);
    }
}
