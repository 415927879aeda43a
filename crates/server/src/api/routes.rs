use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{files, handlers};
use crate::metrics;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Jobs
        .route("/add_magnet", post(handlers::add_magnet))
        .route("/start_convert", post(handlers::start_convert))
        .route("/status", get(handlers::status))
        // Files
        .route("/files", get(files::list_files))
        .route("/download/{filename}", get(files::download_file))
        // Metrics
        .route("/metrics", get(|| async { metrics::encode_metrics() }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
