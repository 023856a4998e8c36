// Ranking orchestration (engine) and its HTTP surface (handlers).

pub mod engine;
pub mod handlers;

pub use engine::{RankedResult, RecommendError, RecommendationEngine};
