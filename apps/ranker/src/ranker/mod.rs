//! Scoring: maps feature vectors to scalar scores.
//!
//! Two strategies sit behind one capability-checked trait:
//! - `LinearScorer`: fixed weights, always available.
//! - `TreeEnsembleRanker`: a learned tree ensemble loaded at startup; may be absent.
//!
//! `select_scores` is the single place that decides between them. It tries the
//! learned model when available, validates its output, and falls back to the
//! linear scorer on absence, error, wrong length or any non-finite prediction.

pub mod linear;
pub mod training;
pub mod tree_ensemble;

pub use linear::LinearScorer;
pub use tree_ensemble::TreeEnsembleRanker;

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::features::FeatureVector;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RankerError {
    #[error("failed to read ranker model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ranker model is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed ranker model: {0}")]
    Malformed(String),

    #[error("ranker model is not loaded")]
    Unavailable,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait
// ────────────────────────────────────────────────────────────────────────────

/// A scoring backend. Callers check `available` before `predict`; `select_scores`
/// does both and owns the fallback.
pub trait RankingModel: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    fn available(&self) -> bool;

    /// One raw score per row, in row order. Outputs are not bounded.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, RankerError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Selection
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSelection {
    pub scores: Vec<f64>,
    pub used_learned_model: bool,
}

/// Scores `rows` with the learned model if it is available and its output is
/// usable, else with `fallback`.
pub fn select_scores(
    learned: &dyn RankingModel,
    fallback: &LinearScorer,
    rows: &[FeatureVector],
) -> ScoreSelection {
    if learned.available() {
        match learned.predict(rows) {
            Ok(scores) if scores.len() != rows.len() => {
                warn!(
                    model = learned.name(),
                    expected = rows.len(),
                    got = scores.len(),
                    "Ranker returned wrong number of scores, using linear fallback"
                );
            }
            Ok(scores) if scores.iter().any(|s| !s.is_finite()) => {
                warn!(
                    model = learned.name(),
                    "Ranker returned non-finite scores, using linear fallback"
                );
            }
            Ok(scores) => {
                return ScoreSelection {
                    scores,
                    used_learned_model: true,
                };
            }
            Err(e) => {
                warn!(model = learned.name(), error = %e, "Ranker failed, using linear fallback");
            }
        }
    }

    ScoreSelection {
        scores: rows.iter().map(|row| fallback.score(row.as_slice())).collect(),
        used_learned_model: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSlot;

    /// Returns a fixed prediction per call.
    struct Stub {
        available: bool,
        output: Result<Vec<f64>, ()>,
    }

    impl RankingModel for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn available(&self) -> bool {
            self.available
        }

        fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<f64>, RankerError> {
            self.output
                .clone()
                .map_err(|_| RankerError::Malformed("stub failure".to_string()))
        }
    }

    fn rows() -> Vec<FeatureVector> {
        let mut strong = FeatureVector::zeros();
        strong.set(FeatureSlot::SemanticSimilarity, 1.0);
        strong.set(FeatureSlot::RequiredSkillCoverage, 1.0);
        vec![FeatureVector::zeros(), strong]
    }

    fn linear_scores(rows: &[FeatureVector]) -> Vec<f64> {
        let linear = LinearScorer::default();
        rows.iter().map(|r| linear.score(r.as_slice())).collect()
    }

    #[test]
    fn test_uses_learned_model_when_output_is_valid() {
        let stub = Stub {
            available: true,
            output: Ok(vec![3.0, -1.0]),
        };
        let sel = select_scores(&stub, &LinearScorer::default(), &rows());
        assert!(sel.used_learned_model);
        assert_eq!(sel.scores, vec![3.0, -1.0]);
    }

    #[test]
    fn test_unavailable_model_falls_back() {
        let stub = Stub {
            available: false,
            output: Ok(vec![9.0, 9.0]),
        };
        let rows = rows();
        let sel = select_scores(&stub, &LinearScorer::default(), &rows);
        assert!(!sel.used_learned_model);
        assert_eq!(sel.scores, linear_scores(&rows));
    }

    #[test]
    fn test_non_finite_output_falls_back() {
        let stub = Stub {
            available: true,
            output: Ok(vec![0.5, f64::NAN]),
        };
        let rows = rows();
        let sel = select_scores(&stub, &LinearScorer::default(), &rows);
        assert!(!sel.used_learned_model);
        assert_eq!(sel.scores, linear_scores(&rows));
    }

    #[test]
    fn test_model_error_falls_back() {
        let stub = Stub {
            available: true,
            output: Err(()),
        };
        let sel = select_scores(&stub, &LinearScorer::default(), &rows());
        assert!(!sel.used_learned_model);
    }

    #[test]
    fn test_wrong_length_output_falls_back() {
        let stub = Stub {
            available: true,
            output: Ok(vec![0.5]),
        };
        let sel = select_scores(&stub, &LinearScorer::default(), &rows());
        assert!(!sel.used_learned_model);
        assert_eq!(sel.scores.len(), 2);
    }
}
