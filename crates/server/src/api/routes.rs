use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{files, handlers, pull};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Job intake
        .route("/pull", post(pull::pull))
        // Artifact delivery
        .route(
            "/download/",
            get(files::missing_name).options(files::preflight),
        )
        .route(
            "/download/{*file}",
            get(files::download).options(files::preflight),
        )
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
