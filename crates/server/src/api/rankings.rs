//! Popularity rankings over the whole collection or a list of ids.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use appcatalog_core::{NameCount, RankingSort, ScoredName, TagRankingOptions};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TagRankingParams {
    /// Comma separated ids; the whole collection when absent.
    #[serde(default)]
    pub ids: Option<String>,
    #[serde(default)]
    pub weight_factor: Option<f32>,
    #[serde(default)]
    pub tags_per_game: Option<usize>,
    #[serde(default)]
    pub min_score: Option<f32>,
    #[serde(default)]
    pub exclude_genres: bool,
    #[serde(default)]
    pub sort: RankingSort,
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    #[serde(default)]
    pub ids: Option<String>,
    #[serde(default)]
    pub min_count: u32,
}

fn parse_scope(ids: Option<&str>) -> Result<Option<Vec<u32>>, ApiError> {
    let Some(ids) = ids.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    ids.split(',')
        .map(|id| {
            id.trim().parse::<u32>().map_err(|_| {
                api_error(StatusCode::BAD_REQUEST, format!("Invalid id in scope: {}", id))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/rankings/tags
pub async fn tag_ranking(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TagRankingParams>,
) -> Result<Json<Vec<ScoredName>>, ApiError> {
    let scope = parse_scope(params.ids.as_deref())?;

    let defaults = TagRankingOptions::default();
    let options = TagRankingOptions {
        weight_factor: params.weight_factor.unwrap_or(defaults.weight_factor),
        tags_per_game: params.tags_per_game.unwrap_or(defaults.tags_per_game),
        min_score: params.min_score.unwrap_or(defaults.min_score),
        exclude_genres: params.exclude_genres,
        sort: params.sort,
    };

    let db = state.database().read().await;
    Ok(Json(db.tag_ranking(scope.as_deref(), &options)))
}

/// GET /api/v1/rankings/developers
pub async fn developer_ranking(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<NameCount>>, ApiError> {
    let scope = parse_scope(params.ids.as_deref())?;
    let db = state.database().read().await;
    Ok(Json(db.developer_counts(scope.as_deref(), params.min_count)))
}

/// GET /api/v1/rankings/publishers
pub async fn publisher_ranking(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<NameCount>>, ApiError> {
    let scope = parse_scope(params.ids.as_deref())?;
    let db = state.database().read().await;
    Ok(Json(db.publisher_counts(scope.as_deref(), params.min_count)))
}
