//! Types for scrape batches.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::ScrapeConfig;
use crate::database::MergeOutcome;
use crate::store_page::FetchFailure;

/// Runner tuning.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Concurrent fetches per batch.
    pub max_workers: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self { max_workers: 8 }
    }
}

impl From<&ScrapeConfig> for ScrapeSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            max_workers: config.max_workers,
        }
    }
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Running,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "running",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

/// What happened to one id of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum IdOutcome {
    Merged(MergeOutcome),
    /// The record was left untouched.
    Failed(FetchFailure),
    /// Cancelled before its fetch started.
    Skipped,
    /// Fetched, but the batch was cancelled before the merge.
    Discarded,
}

#[derive(Debug)]
struct BatchState {
    status: BatchStatus,
    finished_at: Option<DateTime<Utc>>,
}

/// Shared view of a running or finished batch.
#[derive(Debug)]
pub struct BatchHandle {
    id: Uuid,
    started_at: DateTime<Utc>,
    cancel: AtomicBool,
    total: AtomicUsize,
    merged: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    discarded: AtomicUsize,
    state: RwLock<BatchState>,
}

impl BatchHandle {
    pub fn new(total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            cancel: AtomicBool::new(false),
            total: AtomicUsize::new(total),
            merged: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
            state: RwLock::new(BatchState {
                status: BatchStatus::Running,
                finished_at: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the batch to stop. Returns false if already requested.
    pub fn cancel(&self) -> bool {
        !self.cancel.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, outcome: &IdOutcome) {
        let counter = match outcome {
            IdOutcome::Merged(_) => &self.merged,
            IdOutcome::Failed(_) => &self.failed,
            IdOutcome::Skipped => &self.skipped,
            IdOutcome::Discarded => &self.discarded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) async fn finish(&self, status: BatchStatus) {
        let mut state = self.state.write().await;
        state.status = status;
        state.finished_at = Some(Utc::now());
    }

    pub async fn status(&self) -> BatchStatus {
        self.state.read().await.status
    }

    pub async fn snapshot(&self) -> BatchSnapshot {
        let state = self.state.read().await;
        let merged = self.merged.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let skipped = self.skipped.load(Ordering::Relaxed);
        let discarded = self.discarded.load(Ordering::Relaxed);

        BatchSnapshot {
            id: self.id,
            status: state.status,
            cancel_requested: self.is_cancelled(),
            total: self.total.load(Ordering::Relaxed),
            processed: merged + failed + skipped + discarded,
            merged,
            failed,
            skipped,
            discarded,
            started_at: self.started_at,
            finished_at: state.finished_at,
        }
    }
}

/// Point-in-time progress of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub id: Uuid,
    pub status: BatchStatus,
    pub cancel_requested: bool,
    pub total: usize,
    pub processed: usize,
    pub merged: usize,
    pub failed: usize,
    pub skipped: usize,
    pub discarded: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Result of [`ScrapeRunner::run`](super::ScrapeRunner::run).
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    /// Per-id outcomes in completion order.
    pub outcomes: Vec<(u32, IdOutcome)>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn outcome(&self, id: u32) -> Option<&IdOutcome> {
        self.outcomes
            .iter()
            .find(|(outcome_id, _)| *outcome_id == id)
            .map(|(_, outcome)| outcome)
    }

    pub fn merged(&self) -> usize {
        self.count(|o| matches!(o, IdOutcome::Merged(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, IdOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, IdOutcome::Skipped))
    }

    pub fn discarded(&self) -> usize {
        self.count(|o| matches!(o, IdOutcome::Discarded))
    }

    fn count(&self, predicate: impl Fn(&IdOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_counters() {
        let handle = BatchHandle::new(4);
        handle.record(&IdOutcome::Merged(MergeOutcome::Inserted));
        handle.record(&IdOutcome::Failed(FetchFailure::SiteError));
        handle.record(&IdOutcome::Skipped);

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.status, BatchStatus::Running);
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.merged, 1);
        assert_eq!(snapshot.failed, 1);
        assert!(snapshot.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_cancel_once() {
        let handle = BatchHandle::new(1);
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());

        handle.finish(BatchStatus::Cancelled).await;
        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.status, BatchStatus::Cancelled);
        assert!(snapshot.finished_at.is_some());
    }

    #[test]
    fn test_snapshot_serialization() {
        let json = serde_json::to_value(BatchStatus::Completed).unwrap();
        assert_eq!(json, "completed");
    }
}
