//! Learned ranker — a gradient-boosted regression tree ensemble read from
//! XGBoost's JSON model format.
//!
//! Layout consumed:
//! ```text
//! learner.learner_model_param.base_score        "5E-1" (string, may be "[5E-1]")
//! learner.gradient_booster.model.trees[]
//!     left_children / right_children            child node ids, -1 on leaves
//!     split_indices                             feature index per split
//!     split_conditions                          threshold, or leaf value on leaves
//!     default_left                              direction for missing values
//! ```
//! Prediction is `base_score + Σ leaf(tree)`. A split sends `x < threshold`
//! left; a missing value (NaN or index beyond the row) follows `default_left`.
//!
//! Loading validates the whole structure up front so `predict_row` can walk
//! trees without bounds failures. A model that fails validation is never
//! partially used.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{RankerError, RankingModel};
use crate::features::FeatureVector;

const DEFAULT_BASE_SCORE: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    learner_model_param: LearnerModelParam,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Default, Deserialize)]
struct LearnerModelParam {
    #[serde(default)]
    base_score: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    #[serde(default)]
    name: Option<String>,
    model: BoosterModel,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    trees: Vec<RawTree>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
}

/// Older exports write `default_left` as 0/1, newer ones as booleans.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validated model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(index: usize, raw: RawTree) -> Result<Self, RankerError> {
        let n = raw.left_children.len();
        let malformed = |what: &str| RankerError::Malformed(format!("tree {index}: {what}"));

        if n == 0 {
            return Err(malformed("no nodes"));
        }
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
        {
            return Err(malformed("node arrays differ in length"));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (raw.left_children[i], raw.right_children[i]);
            let value = raw.split_conditions[i];
            if !value.is_finite() {
                return Err(malformed("non-finite split condition"));
            }

            if left == -1 {
                if right != -1 {
                    return Err(malformed("leaf with one child"));
                }
                nodes.push(Node::Leaf(value));
                continue;
            }

            // Children always follow their parent; this also rules out cycles.
            let child = |c: i64| -> Result<usize, RankerError> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| malformed("child index out of range"))
            };
            let feature = usize::try_from(raw.split_indices[i])
                .map_err(|_| malformed("negative split index"))?;

            nodes.push(Node::Split {
                feature,
                threshold: value,
                left: child(left)?,
                right: child(right)?,
                default_left: raw.default_left[i].is_set(),
            });
        }
        Ok(Self { nodes })
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = row.get(feature).copied().unwrap_or(f64::NAN);
                    idx = if x.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if x < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A fully validated regression tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn from_json_str(json: &str) -> Result<Self, RankerError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let booster = file.learner.gradient_booster;
        if let Some(name) = booster.name.as_deref() {
            if name != "gbtree" {
                return Err(RankerError::Malformed(format!(
                    "unsupported booster '{name}'"
                )));
            }
        }

        let base_score = parse_base_score(file.learner.learner_model_param.base_score.as_ref())?;
        let trees = booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(i, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { base_score, trees })
    }

    pub fn load(path: &Path) -> Result<Self, RankerError> {
        let json = std::fs::read_to_string(path).map_err(|source| RankerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

/// Accepts `"5E-1"`, `"[5E-1]"` or a bare number; absent means 0.5.
fn parse_base_score(raw: Option<&Value>) -> Result<f64, RankerError> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(DEFAULT_BASE_SCORE),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim()
            .parse::<f64>()
            .ok(),
        Some(_) => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| RankerError::Malformed(format!("invalid base_score {raw:?}")))
}

// ────────────────────────────────────────────────────────────────────────────
// RankingModel adapter
// ────────────────────────────────────────────────────────────────────────────

/// The learned ranker as loaded at startup: either a complete model or absent.
#[derive(Debug, Clone, Default)]
pub struct TreeEnsembleRanker {
    model: Option<TreeEnsemble>,
    source: Option<PathBuf>,
}

impl TreeEnsembleRanker {
    pub fn absent() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_model(model: TreeEnsemble) -> Self {
        Self {
            model: Some(model),
            source: None,
        }
    }

    /// Loads the model at `path`. A missing file is the normal no-model case; a
    /// file that fails to load is logged and also treated as absent.
    pub fn load_or_absent(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No ranker model found, linear scorer only");
            return Self::absent();
        }
        match TreeEnsemble::load(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    trees = model.tree_count(),
                    base_score = model.base_score(),
                    "Ranker model loaded"
                );
                Self {
                    model: Some(model),
                    source: Some(path.to_path_buf()),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ranker model unusable, treating as absent");
                Self::absent()
            }
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn tree_count(&self) -> usize {
        self.model.as_ref().map_or(0, TreeEnsemble::tree_count)
    }
}

impl RankingModel for TreeEnsembleRanker {
    fn name(&self) -> &'static str {
        "xgboost"
    }

    fn available(&self) -> bool {
        self.model.is_some()
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, RankerError> {
        let model = self.model.as_ref().ok_or(RankerError::Unavailable)?;
        Ok(rows.iter().map(|r| model.predict_row(r.as_slice())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSlot;
    use std::io::Write;

    /// Two stumps over slot 0 and slot 1, base score "[5E-1]".
    const MODEL: &str = r#"{
        "learner": {
            "learner_model_param": { "base_score": "[5E-1]", "num_feature": "11" },
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [0, 0, 0],
                            "split_conditions": [0.5, -0.25, 0.25],
                            "default_left": [true, false, false]
                        },
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [1, 0, 0],
                            "split_conditions": [0.3, 0.0, 0.125],
                            "default_left": [0, 0, 0]
                        }
                    ]
                }
            }
        }
    }"#;

    fn row(sim: f64, req: f64) -> Vec<f64> {
        let mut v = vec![0.0; 11];
        v[0] = sim;
        v[1] = req;
        v
    }

    #[test]
    fn test_parses_and_predicts() {
        let m = TreeEnsemble::from_json_str(MODEL).unwrap();
        assert_eq!(m.tree_count(), 2);
        assert_eq!(m.base_score(), 0.5);
        assert_eq!(m.predict_row(&row(0.9, 0.9)), 0.5 + 0.25 + 0.125);
        assert_eq!(m.predict_row(&row(0.1, 0.1)), 0.5 - 0.25 + 0.0);
        // threshold is exclusive on the left
        assert_eq!(m.predict_row(&row(0.5, 0.3)), 0.5 + 0.25 + 0.125);
    }

    #[test]
    fn test_missing_values_follow_default_direction() {
        let m = TreeEnsemble::from_json_str(MODEL).unwrap();
        // tree 0 defaults left on NaN, tree 1 defaults right on a short row
        assert_eq!(m.predict_row(&[f64::NAN]), 0.5 - 0.25 + 0.125);
    }

    #[test]
    fn test_plain_base_score_and_default() {
        let plain = MODEL.replace(r#""[5E-1]""#, r#""0.25""#);
        assert_eq!(TreeEnsemble::from_json_str(&plain).unwrap().base_score(), 0.25);

        let missing = MODEL.replace(r#""base_score": "[5E-1]", "#, "");
        assert_eq!(TreeEnsemble::from_json_str(&missing).unwrap().base_score(), 0.5);
    }

    #[test]
    fn test_rejects_mismatched_arrays() {
        let broken = MODEL.replace("[0.5, -0.25, 0.25]", "[0.5, -0.25]");
        assert!(matches!(
            TreeEnsemble::from_json_str(&broken),
            Err(RankerError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_backward_child_index() {
        let cyclic = MODEL.replacen("\"left_children\": [1, -1, -1]", "\"left_children\": [0, -1, -1]", 1);
        assert!(matches!(
            TreeEnsemble::from_json_str(&cyclic),
            Err(RankerError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(
            TreeEnsemble::from_json_str("not a model"),
            Err(RankerError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_absent() {
        let ranker = TreeEnsembleRanker::load_or_absent(Path::new("/nonexistent/ranker.json"));
        assert!(!ranker.available());
        assert!(matches!(ranker.predict(&[]), Err(RankerError::Unavailable)));
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"learner\": 1 }}").unwrap();
        let ranker = TreeEnsembleRanker::load_or_absent(file.path());
        assert!(!ranker.available());
    }

    #[test]
    fn test_loads_from_file_and_predicts_feature_vectors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MODEL}").unwrap();
        let ranker = TreeEnsembleRanker::load_or_absent(file.path());
        assert!(ranker.available());
        assert_eq!(ranker.tree_count(), 2);
        assert_eq!(ranker.source(), Some(file.path()));

        let mut v = FeatureVector::zeros();
        v.set(FeatureSlot::SemanticSimilarity, 1.0);
        v.set(FeatureSlot::RequiredSkillCoverage, 1.0);
        assert_eq!(ranker.predict(&[v]).unwrap(), vec![0.875]);
    }
}
