//! Collection-wide vocabularies.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use appcatalog_core::database::{LanguageSets, VrSets};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NameListResponse {
    pub kind: String,
    pub count: usize,
    pub values: Vec<String>,
}

/// GET /api/v1/aggregates/{kind}
pub async fn get_names(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<NameListResponse>, ApiError> {
    let db = state.database().read().await;
    let set = match kind.as_str() {
        "genres" => db.all_genres(),
        "tags" => db.all_tags(),
        "flags" => db.all_flags(),
        "developers" => db.all_developers(),
        "publishers" => db.all_publishers(),
        _ => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("Unknown aggregate: {}", kind),
            ))
        }
    };

    Ok(Json(NameListResponse {
        kind,
        count: set.len(),
        values: set.to_vec(),
    }))
}

/// GET /api/v1/aggregates/languages
pub async fn get_languages(State(state): State<Arc<AppState>>) -> Json<LanguageSets> {
    let db = state.database().read().await;
    Json(db.all_languages().as_ref().clone())
}

/// GET /api/v1/aggregates/vr
pub async fn get_vr_flags(State(state): State<Arc<AppState>>) -> Json<VrSets> {
    let db = state.database().read().await;
    Json(db.all_vr_flags().as_ref().clone())
}
