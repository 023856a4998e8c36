mod config;
mod embeddings;
mod errors;
mod features;
mod models;
mod ranker;
mod recommend;
mod routes;
mod skills;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embeddings::{Embedder, HashEmbedder};
use crate::ranker::TreeEnsembleRanker;
use crate::recommend::RecommendationEngine;
use crate::routes::build_router;
use crate::skills::{LooseMatchPolicy, SkillNormalizer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Placement Ranker v{}", env!("CARGO_PKG_VERSION"));

    // Process-wide, read-only resources; loaded once and shared by every request
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(config.embedding_dimension));
    info!(
        "Embedder initialized ({}, dimension {})",
        embedder.name(),
        embedder.dimension()
    );

    let skills = Arc::new(SkillNormalizer::load_or_builtin(&config.skill_map_path));
    info!("Skill normalizer initialized ({} aliases)", skills.len());

    let ranker = Arc::new(TreeEnsembleRanker::load_or_absent(&config.ranker_model_path));
    info!(
        "Learned ranker {} ({} trees)",
        if ranker.source().is_some() { "loaded" } else { "absent" },
        ranker.tree_count()
    );

    let engine = RecommendationEngine::new(embedder, skills, ranker)
        .with_loose_match(LooseMatchPolicy::new(config.loose_match_min_len))
        .with_parallel_min_jobs(config.rank_parallel_min_jobs);
    info!("Scoring backend: {}", if engine.learned_available() { engine.learned_name() } else { "linear" });

    // Build app state
    let state = AppState {
        engine: Arc::new(engine),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
