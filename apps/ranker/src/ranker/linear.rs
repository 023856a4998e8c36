use crate::features::{FeatureSlot, FeatureVector, FEATURE_COUNT};

use super::{RankerError, RankingModel};

/// Hand-tuned weights in slot order. The missing-required penalty is the only
/// negative weight; the rest need not sum to 1.
pub const DEFAULT_WEIGHTS: [f64; FEATURE_COUNT] = [
    0.40,  // semantic similarity
    0.25,  // required-skill coverage
    0.08,  // related-skill coverage
    0.07,  // tool overlap
    -0.10, // missing-required penalty
    0.05,  // domain match
    0.05,  // title-term overlap
    0.04,  // role-title match
    0.03,  // education match
    0.04,  // experience match
    0.02,  // GPA
];

/// Fixed-weight dot product, clamped to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScorer {
    weights: Vec<f64>,
}

impl LinearScorer {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    #[cfg(test)]
    pub fn weight(&self, slot: FeatureSlot) -> f64 {
        self.weights.get(slot.index()).copied().unwrap_or(0.0)
    }

    /// Scores a raw row of any width: missing trailing slots count as 0, extra
    /// slots are ignored, non-finite inputs count as 0.
    pub fn score(&self, features: &[f64]) -> f64 {
        let dot: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, &x)| if x.is_finite() { w * x } else { 0.0 })
            .sum();
        if dot.is_finite() {
            dot.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for LinearScorer {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS.to_vec())
    }
}

impl RankingModel for LinearScorer {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn available(&self) -> bool {
        true
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, RankerError> {
        Ok(rows.iter().map(|r| self.score(r.as_slice())).collect())
    }
}
