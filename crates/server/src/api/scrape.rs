//! Scrape batch control.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use appcatalog_core::{scrape::BatchSnapshot, BatchStatus};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    /// Ids to scrape.
    #[serde(default)]
    pub ids: Vec<u32>,
    /// Also queue every known id that has never been scraped.
    #[serde(default)]
    pub unscraped: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchListResponse {
    pub batches: Vec<BatchSnapshot>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/scrape
///
/// Start a batch in the background and return its initial snapshot.
pub async fn start_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<(StatusCode, Json<BatchSnapshot>), ApiError> {
    let mut ids = request.ids;
    if request.unscraped {
        let db = state.database().read().await;
        ids.extend(db.entries().filter(|e| !e.has_page_data()).map(|e| e.id));
    }
    ids.retain(|id| *id > 0);
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No ids to scrape"));
    }

    let batch = state.batches().create(ids.len()).await;
    info!("Queued scrape batch {} with {} ids", batch.id(), ids.len());

    let runner = Arc::clone(state.runner());
    let handle = Arc::clone(&batch);
    tokio::spawn(async move {
        runner.run(&ids, &handle).await;
    });

    Ok((StatusCode::ACCEPTED, Json(batch.snapshot().await)))
}

/// GET /api/v1/scrape
pub async fn list_batches(State(state): State<Arc<AppState>>) -> Json<BatchListResponse> {
    let batches = state.batches().list().await;
    let total = batches.len();
    Json(BatchListResponse { batches, total })
}

/// GET /api/v1/scrape/{batch_id}
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchSnapshot>, ApiError> {
    let batch = state
        .batches()
        .get(batch_id)
        .await
        .ok_or_else(|| not_found(batch_id))?;
    Ok(Json(batch.snapshot().await))
}

/// DELETE /api/v1/scrape/{batch_id}
///
/// Request cancellation; work in flight finishes but is not merged.
pub async fn cancel_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchSnapshot>, ApiError> {
    let batch = state
        .batches()
        .get(batch_id)
        .await
        .ok_or_else(|| not_found(batch_id))?;

    if batch.status().await != BatchStatus::Running {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("Batch already finished: {}", batch_id),
        ));
    }

    if batch.cancel() {
        info!("Cancellation requested for batch {}", batch_id);
    }
    Ok(Json(batch.snapshot().await))
}

fn not_found(batch_id: Uuid) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Batch not found: {}", batch_id),
    )
}
