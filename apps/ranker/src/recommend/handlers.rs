use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::features::FeatureOutput;
use crate::models::{embedding, lenient_f64, JobPosting, StudentProfile};
use crate::ranker::training::{read_training_csv, write_training_csv, TrainingExample};
use crate::recommend::RankedResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub student: StudentProfile,
    #[serde(default, deserialize_with = "lenient_jobs")]
    pub jobs: Vec<JobPosting>,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub student_id: String,
    pub used_learned_model: bool,
    pub results: Vec<RankedResult>,
}

#[derive(Deserialize)]
pub struct FeaturesRequest {
    #[serde(default)]
    pub student: StudentProfile,
    #[serde(default)]
    pub job: JobPosting,
    #[serde(default, deserialize_with = "embedding")]
    pub student_vec: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "embedding")]
    pub job_vec: Option<Vec<f32>>,
}

#[derive(Deserialize)]
pub struct LabeledPair {
    #[serde(default)]
    pub student: StudentProfile,
    #[serde(default)]
    pub job: JobPosting,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub label: Option<f64>,
}

#[derive(Deserialize)]
pub struct TrainingRowsRequest {
    #[serde(default)]
    pub pairs: Vec<LabeledPair>,
}

#[derive(Serialize)]
pub struct ScoredRow {
    pub student_id: String,
    pub label: f64,
    pub score: f64,
}

#[derive(Serialize)]
pub struct TrainingScoreResponse {
    pub used_learned_model: bool,
    pub rows: Vec<ScoredRow>,
}

/// A job entry that is not an object still occupies its slot as an empty job,
/// so one bad entry never fails the batch.
fn lenient_jobs<'de, D>(deserializer: D) -> Result<Vec<JobPosting>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|v| {
            serde_json::from_value(v).unwrap_or_else(|e| {
                debug!(error = %e, "Malformed job entry, scoring as empty");
                JobPosting::default()
            })
        })
        .collect())
}

/// POST /api/v1/recommend
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    // CPU-bound: embeddings, features and scoring for the whole batch.
    let engine = state.engine.clone();
    let RecommendRequest { student, jobs } = req;
    let student_id = student.id.clone();
    let recommendation = tokio::task::spawn_blocking(move || engine.recommend(&student, &jobs))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in recommend: {e}")))??;

    Ok(Json(RecommendResponse {
        student_id,
        used_learned_model: recommendation.used_learned_model,
        results: recommendation.results,
    }))
}

/// POST /api/v1/features
pub async fn handle_build_features(
    State(state): State<AppState>,
    Json(req): Json<FeaturesRequest>,
) -> Result<Json<FeatureOutput>, AppError> {
    let engine = state.engine.clone();
    let output = tokio::task::spawn_blocking(move || {
        engine.build_features(
            &req.student,
            &req.job,
            req.student_vec.as_deref(),
            req.job_vec.as_deref(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in build_features: {e}")))?;

    Ok(Json(output))
}

/// POST /api/v1/training/rows
///
/// Labelled (student, job) pairs in, training CSV out. Rows are built by the
/// same pipeline `recommend` runs, so a model fitted on them sees serving-time
/// features.
pub async fn handle_training_rows(
    State(state): State<AppState>,
    Json(req): Json<TrainingRowsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.pairs.is_empty() {
        return Err(AppError::Validation("at least one labelled pair is required".to_string()));
    }
    let labels = req
        .pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| match pair.label {
            Some(label) if label.is_finite() => Ok(label),
            _ => Err(AppError::Validation(format!(
                "pair {}: label must be a finite number",
                i + 1
            ))),
        })
        .collect::<Result<Vec<f64>, AppError>>()?;

    let engine = state.engine.clone();
    let csv = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let examples: Vec<TrainingExample> = req
            .pairs
            .iter()
            .zip(labels)
            .map(|(pair, label)| engine.training_example(&pair.student, &pair.job, label))
            .collect();
        let mut buf = Vec::new();
        write_training_csv(&mut buf, &examples).map_err(|e| AppError::Internal(e.into()))?;
        debug!(rows = examples.len(), "Training rows exported");
        Ok(buf)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in training_rows: {e}")))??;

    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}

/// POST /api/v1/training/score
///
/// Scores every row of a training CSV with the loaded ranker (or the linear
/// fallback). Rows of the wrong width are rejected with their row number.
pub async fn handle_training_score(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TrainingScoreResponse>, AppError> {
    let examples = read_training_csv(body.as_bytes())?;
    if examples.is_empty() {
        return Err(AppError::Validation("training file has no rows".to_string()));
    }

    let engine = state.engine.clone();
    let response = tokio::task::spawn_blocking(move || {
        let rows: Vec<_> = examples.iter().map(|e| e.features).collect();
        let selection = engine.score_rows(&rows);
        TrainingScoreResponse {
            used_learned_model: selection.used_learned_model,
            rows: examples
                .into_iter()
                .zip(selection.scores)
                .map(|(e, score)| ScoredRow {
                    student_id: e.student_id,
                    label: e.label,
                    score,
                })
                .collect(),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in training_score: {e}")))?;

    Ok(Json(response))
}
