// src/api/http/router.rs
// HTTP router composition for the prediction API

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{download_handler, health_handler, root_handler, test_r_handler};
use super::predict::predict_handler;
use crate::state::AppState;

/// Full application router.
pub fn app_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        // Landing page and health
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Prediction pipeline
        .route("/api/predict", post(predict_handler))
        .route("/api/download/results", get(download_handler))
        // Diagnostics
        .route("/api/test-r", get(test_r_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return base.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => base.allow_origin(value),
        Err(_) => {
            warn!(origin, "invalid CORS origin, allowing any");
            base.allow_origin(Any)
        }
    }
}
