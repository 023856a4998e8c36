use std::sync::Arc;

use crate::recommend::RecommendationEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; holds the embedder, skill map and learned ranker.
    pub engine: Arc<RecommendationEngine>,
}
