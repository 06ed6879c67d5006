//! Record lookups with parent fallback.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use appcatalog_core::{Entry, VrSupport};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FallbackParams {
    /// Parent hops to walk; the configured default when absent.
    #[serde(default)]
    pub depth: Option<u32>,
    /// Promote tags that are known genres when the genre list is empty.
    #[serde(default)]
    pub tag_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub id: u32,
    pub field: String,
    pub depth: u32,
    pub values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VrResponse {
    pub id: u32,
    pub depth: u32,
    pub supports_vr: bool,
    pub vr_support: VrSupport,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/apps/{id}
pub async fn get_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Entry>, ApiError> {
    let db = state.database().read().await;
    db.get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// GET /api/v1/apps/{id}/{field}
///
/// One list field of a record, inherited from its parents when empty.
pub async fn get_field(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(u32, String)>,
    Query(params): Query<FallbackParams>,
) -> Result<Json<FieldResponse>, ApiError> {
    let depth = params.depth.unwrap_or_else(|| state.default_depth());
    let db = state.database().read().await;

    let values = match field.as_str() {
        "genres" => db.genres_for(id, depth, params.tag_fallback),
        "tags" => db.tags_for(id, depth),
        "flags" => db.flags_for(id, depth),
        "developers" => db.developers_for(id, depth),
        "publishers" => db.publishers_for(id, depth),
        _ => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("Unknown field: {}", field),
            ))
        }
    };

    let values = values.ok_or_else(|| not_found(id))?;
    Ok(Json(FieldResponse {
        id,
        field,
        depth,
        values,
    }))
}

/// GET /api/v1/apps/{id}/vr
pub async fn get_vr(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Query(params): Query<FallbackParams>,
) -> Result<Json<VrResponse>, ApiError> {
    let depth = params.depth.unwrap_or_else(|| state.default_depth());
    let db = state.database().read().await;

    let vr_support = db.vr_support_for(id, depth).ok_or_else(|| not_found(id))?;
    Ok(Json(VrResponse {
        id,
        depth,
        supports_vr: db.supports_vr(id, depth),
        vr_support,
    }))
}

fn not_found(id: u32) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("App not found: {}", id))
}
