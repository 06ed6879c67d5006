//! Collection maintenance: saving, language switches and bulk feeds.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use appcatalog_core::sources::{parse_app_list, parse_playtimes};
use appcatalog_core::{AppListItem, CatalogRecord, PlaytimeRecord, SourceError};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub path: String,
    pub entries: usize,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    pub language: String,
    /// Ids whose language dependent data was reset.
    pub rescrape_ids: Vec<u32>,
}

/// Body of the feed endpoints. Without `feed` the configured source is
/// fetched; with it, the document is parsed as if it had been fetched.
#[derive(Debug, Default, Deserialize)]
pub struct FeedRequest {
    #[serde(default)]
    pub feed: Option<Value>,
    #[serde(default)]
    pub include_imputed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogRequest {
    pub records: Vec<CatalogRecord>,
    /// Catalog timestamp; now when absent.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    /// Records in the feed.
    pub received: usize,
    /// New ids for the app list, updated records otherwise.
    pub applied: usize,
    pub entries: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/database/save
pub async fn save(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>, ApiError> {
    let path = &state.config().database.path;
    let db = state.database().read().await;

    db.save(path)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SaveResponse {
        path: path.display().to_string(),
        entries: db.len(),
    }))
}

/// POST /api/v1/database/language
pub async fn change_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<LanguageResponse>, ApiError> {
    let language = request.language.trim();
    if language.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Language must not be empty"));
    }

    let mut db = state.database().write().await;
    let rescrape_ids = db.change_language(language);

    Ok(Json(LanguageResponse {
        language: db.language().to_string(),
        rescrape_ids,
    }))
}

/// POST /api/v1/database/app-list
pub async fn integrate_app_list(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let items: Vec<AppListItem> = match request.feed {
        Some(feed) => parse_app_list(&feed.to_string()).map_err(feed_error)?,
        None => source(&state)?.fetch_app_list().await.map_err(feed_error)?,
    };

    let mut db = state.database().write().await;
    let applied = db.integrate_app_list(&items);

    Ok(Json(FeedResponse {
        received: items.len(),
        applied,
        entries: db.len(),
    }))
}

/// POST /api/v1/database/playtimes
pub async fn apply_playtimes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let records: Vec<PlaytimeRecord> = match request.feed {
        Some(feed) => parse_playtimes(&feed.to_string()).map_err(feed_error)?,
        None => source(&state)?.fetch_playtimes().await.map_err(feed_error)?,
    };
    let include_imputed = request
        .include_imputed
        .unwrap_or(state.config().sources.include_imputed_times);

    let mut db = state.database().write().await;
    let applied = db.apply_playtimes(&records, include_imputed, Utc::now().timestamp());
    info!("Applied playtimes to {} of {} records", applied, records.len());

    Ok(Json(FeedResponse {
        received: records.len(),
        applied,
        entries: db.len(),
    }))
}

/// POST /api/v1/database/catalog
pub async fn integrate_catalog(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CatalogRequest>,
) -> Json<FeedResponse> {
    let timestamp = request.timestamp.unwrap_or_else(|| Utc::now().timestamp());

    let mut db = state.database().write().await;
    let applied = db.integrate_catalog(&request.records, timestamp);

    Json(FeedResponse {
        received: request.records.len(),
        applied,
        entries: db.len(),
    })
}

fn source(state: &AppState) -> Result<&appcatalog_core::SourceClient, ApiError> {
    state.sources().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No feed client available; post the feed document instead",
        )
    })
}

fn feed_error(e: SourceError) -> ApiError {
    let status = match e {
        SourceError::Parse(_) => StatusCode::BAD_REQUEST,
        SourceError::Http(_) | SourceError::Status { .. } => StatusCode::BAD_GATEWAY,
    };
    api_error(status, e.to_string())
}
