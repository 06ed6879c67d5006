//! Worker pool that turns ids into merged records.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::database::SharedDatabase;
use crate::extract::extract;
use crate::metrics;
use crate::store_page::StorePageFetcher;

use super::types::{BatchHandle, BatchReport, BatchStatus, IdOutcome, ScrapeSettings};

pub struct ScrapeRunner {
    fetcher: Arc<StorePageFetcher>,
    database: SharedDatabase,
    settings: ScrapeSettings,
}

impl ScrapeRunner {
    pub fn new(
        fetcher: Arc<StorePageFetcher>,
        database: SharedDatabase,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            fetcher,
            database,
            settings,
        }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }

    /// Scrape `ids` into the collection under `batch`.
    ///
    /// Ids are de-duplicated and id 0 is dropped. Failures are logged and
    /// recorded per id; they never stop the batch.
    pub async fn run(&self, ids: &[u32], batch: &BatchHandle) -> BatchReport {
        let started = Instant::now();

        let mut seen = HashSet::with_capacity(ids.len());
        let ids: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|id| *id > 0 && seen.insert(*id))
            .collect();
        batch.set_total(ids.len());

        let language = self.database.read().await.language().to_string();
        let workers = self.settings.max_workers.max(1);

        info!(
            batch_id = %batch.id(),
            ids = ids.len(),
            workers,
            language = %language,
            "Starting scrape batch"
        );

        let language = language.as_str();
        let outcomes: Vec<(u32, IdOutcome)> = stream::iter(ids)
            .map(move |id| async move {
                let outcome = self.scrape_one(id, language, batch).await;
                batch.record(&outcome);
                (id, outcome)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let status = if batch.is_cancelled() {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };
        batch.finish(status).await;

        let duration = started.elapsed();
        metrics::BATCHES.with_label_values(&[status.as_str()]).inc();
        metrics::BATCH_DURATION
            .with_label_values(&[status.as_str()])
            .observe(duration.as_secs_f64());

        let report = BatchReport {
            batch_id: batch.id(),
            status,
            outcomes,
            duration,
        };
        info!(
            batch_id = %batch.id(),
            status = status.as_str(),
            merged = report.merged(),
            failed = report.failed(),
            skipped = report.skipped(),
            discarded = report.discarded(),
            duration_ms = duration.as_millis() as u64,
            "Scrape batch finished"
        );
        report
    }

    async fn scrape_one(&self, id: u32, language: &str, batch: &BatchHandle) -> IdOutcome {
        if batch.is_cancelled() {
            return IdOutcome::Skipped;
        }

        let page = match self.fetcher.fetch(id, language).await {
            Ok(page) => page,
            Err(failure) => {
                warn!(app_id = id, reason = failure.reason(), error = %failure, "Store page fetch failed");
                return IdOutcome::Failed(failure);
            }
        };

        let entry = extract(&page.body).into_entry(id, Utc::now().timestamp(), None);

        let mut db = self.database.write().await;
        if batch.is_cancelled() {
            metrics::DISCARDED_RESULTS.inc();
            debug!(app_id = id, "Discarding result of cancelled batch");
            return IdOutcome::Discarded;
        }
        if !db.language().eq_ignore_ascii_case(language) {
            metrics::DISCARDED_RESULTS.inc();
            debug!(
                app_id = id,
                fetched = language,
                current = db.language(),
                "Discarding page fetched in a previous language"
            );
            return IdOutcome::Discarded;
        }

        let outcome = db.merge_entry(entry);
        if let Some(alias) = page.alias_id {
            db.link_parent(id, alias);
        }
        IdOutcome::Merged(outcome)
    }
}
