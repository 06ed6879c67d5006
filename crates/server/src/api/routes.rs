use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{aggregates, apps, database, handlers, middleware::metrics_middleware, rankings, scrape};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Records
        .route("/apps/{id}", get(apps::get_app))
        .route("/apps/{id}/vr", get(apps::get_vr))
        .route("/apps/{id}/{field}", get(apps::get_field))
        // Aggregates
        .route("/aggregates/languages", get(aggregates::get_languages))
        .route("/aggregates/vr", get(aggregates::get_vr_flags))
        .route("/aggregates/{kind}", get(aggregates::get_names))
        // Rankings
        .route("/rankings/tags", get(rankings::tag_ranking))
        .route("/rankings/developers", get(rankings::developer_ranking))
        .route("/rankings/publishers", get(rankings::publisher_ranking))
        // Scrape batches
        .route("/scrape", post(scrape::start_batch).get(scrape::list_batches))
        .route(
            "/scrape/{batch_id}",
            get(scrape::get_batch).delete(scrape::cancel_batch),
        )
        // Collection maintenance
        .route("/database/save", post(database::save))
        .route("/database/language", post(database::change_language))
        .route("/database/app-list", post(database::integrate_app_list))
        .route("/database/catalog", post(database::integrate_catalog))
        .route("/database/playtimes", post(database::apply_playtimes));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
