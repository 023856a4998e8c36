//! Training interchange — the CSV handed from dataset generation to model fitting.
//!
//! One row per (student, job) pair: `student_id,features,label`, where `features`
//! is the feature vector as a JSON array in slot order. Rows are written with the
//! same slot order the engine builds at serving time, so a model fitted on this
//! file can be loaded back by `TreeEnsembleRanker`.
//!
//! Served by `POST /api/v1/training/rows` (export) and
//! `POST /api/v1/training/score` (read back and score).

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_COUNT};

#[derive(Debug, Error)]
pub enum TrainingDataError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: features column is not a JSON number array: {source}")]
    Features {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row}: expected {expected} features, found {found}", expected = FEATURE_COUNT)]
    Width { row: usize, found: usize },

    #[error("row {row}: label is not finite")]
    Label { row: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub student_id: String,
    pub features: FeatureVector,
    pub label: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    student_id: String,
    features: String,
    label: f64,
}

pub fn write_training_csv<W: Write>(
    writer: W,
    examples: &[TrainingExample],
) -> Result<(), TrainingDataError> {
    let mut csv = csv::Writer::from_writer(writer);
    for example in examples {
        csv.serialize(CsvRow {
            student_id: example.student_id.clone(),
            features: example.features.to_json(),
            label: example.label,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads every row, rejecting any whose feature array is not exactly
/// `FEATURE_COUNT` wide. Row numbers in errors are 1-based data rows.
pub fn read_training_csv<R: Read>(reader: R) -> Result<Vec<TrainingExample>, TrainingDataError> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut examples = Vec::new();

    for (i, record) in csv.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let record = record?;
        let values: Vec<f64> = serde_json::from_str(&record.features)
            .map_err(|source| TrainingDataError::Features { row, source })?;
        let features = FeatureVector::from_slice(&values).ok_or(TrainingDataError::Width {
            row,
            found: values.len(),
        })?;
        if !record.label.is_finite() {
            return Err(TrainingDataError::Label { row });
        }
        examples.push(TrainingExample {
            student_id: record.student_id,
            features,
            label: record.label,
        });
    }
    Ok(examples)
}
