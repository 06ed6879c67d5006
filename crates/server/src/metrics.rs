//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the catalog server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Collection size and running batches (collected dynamically)
//! - Everything the core library records (fetches, merges, batches)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;
use uuid::Uuid;

use appcatalog_core::BatchStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "appcatalog_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("appcatalog_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "appcatalog_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Collection Metrics (collected dynamically)
// =============================================================================

/// Records in the collection.
pub static COLLECTION_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "appcatalog_collection_entries",
        "Number of records in the collection",
    )
    .unwrap()
});

/// Batches that have not finished yet.
pub static SCRAPE_BATCHES_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "appcatalog_scrape_batches_running",
        "Number of scrape batches currently running",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Collection
    registry
        .register(Box::new(COLLECTION_ENTRIES.clone()))
        .unwrap();
    registry
        .register(Box::new(SCRAPE_BATCHES_RUNNING.clone()))
        .unwrap();

    // Core metrics (store fetches, merges, feeds, batches)
    for metric in appcatalog_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    COLLECTION_ENTRIES.set(state.database().read().await.len() as i64);

    let running = state
        .batches()
        .list()
        .await
        .iter()
        .filter(|b| b.status == BatchStatus::Running)
        .count();
    SCRAPE_BATCHES_RUNNING.set(running as i64);
}

/// Normalize a path for metric labels (replace ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_id = (!segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
                || Uuid::parse_str(segment).is_ok();
            if is_id {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
