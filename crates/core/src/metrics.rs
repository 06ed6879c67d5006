//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Store page fetches (results, latency, redirects followed)
//! - Merges into the collection
//! - Scrape batches
//! - Bulk feed ingestion

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Store page fetches
// =============================================================================

/// Store page fetches total by result.
pub static STORE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "appcatalog_store_fetches_total",
            "Total storefront page fetches",
        ),
        &["result"], // "ok" or a failure reason such as "too_many_redirects"
    )
    .unwrap()
});

/// Store page fetch duration in seconds, redirects included.
pub static STORE_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "appcatalog_store_fetch_duration_seconds",
            "Duration of a storefront page fetch including redirects",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Redirect hops followed.
pub static STORE_REDIRECTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "appcatalog_store_redirects_total",
        "Total storefront redirects followed",
    )
    .unwrap()
});

// =============================================================================
// Collection
// =============================================================================

/// Merges into the collection by outcome.
pub static MERGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("appcatalog_merges_total", "Total records merged"),
        &["outcome"], // "inserted", "merged"
    )
    .unwrap()
});

/// Records touched by bulk feeds.
pub static FEED_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "appcatalog_feed_records_total",
            "Records applied from bulk feeds",
        ),
        &["feed"], // "app_list", "catalog", "playtime"
    )
    .unwrap()
});

// =============================================================================
// Scrape batches
// =============================================================================

/// Finished batches by final status.
pub static BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("appcatalog_scrape_batches_total", "Total scrape batches"),
        &["status"], // "completed", "cancelled"
    )
    .unwrap()
});

/// Batch duration in seconds.
pub static BATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "appcatalog_scrape_batch_duration_seconds",
            "Duration of a scrape batch",
        )
        .buckets(vec![1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        &["status"],
    )
    .unwrap()
});

/// Results computed after cancellation and never merged.
pub static DISCARDED_RESULTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "appcatalog_scrape_discarded_total",
        "Scrape results discarded because the batch was cancelled",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Store
        Box::new(STORE_FETCHES.clone()),
        Box::new(STORE_FETCH_DURATION.clone()),
        Box::new(STORE_REDIRECTS.clone()),
        // Collection
        Box::new(MERGES.clone()),
        Box::new(FEED_RECORDS.clone()),
        // Batches
        Box::new(BATCHES.clone()),
        Box::new(BATCH_DURATION.clone()),
        Box::new(DISCARDED_RESULTS.clone()),
    ]
}
