pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommend::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/recommend", post(handlers::handle_recommend))
        .route("/api/v1/features", post(handlers::handle_build_features))
        .route("/api/v1/training/rows", post(handlers::handle_training_rows))
        .route("/api/v1/training/score", post(handlers::handle_training_score))
        .with_state(state)
}
