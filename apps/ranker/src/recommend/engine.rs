//! Recommendation Engine — one student against N jobs, ranked best-first.
//!
//! Algorithm:
//! 1. Clean the student profile and canonicalize its skills once.
//! 2. Embed the resume once (or reuse a precomputed vector of the right width).
//! 3. Per job: canonicalize every skill list, extracting skills from the body
//!    text when the job declares none; embed the composite job text; build the
//!    feature vector and reasons. Batches at or above `parallel_min_jobs` fan
//!    out over rayon; `collect` keeps job input order.
//! 4. Score all rows through `select_scores` (learned model or linear fallback).
//! 5. Min-max normalize raw scores to a 0–100 match percent.
//! 6. Stable sort by raw score, descending.
//!
//! `training_example` and `score_rows` expose the same pipeline to the training
//! interchange: exported rows are built exactly as step 3 builds them, and
//! rows read back are scored through step 4.
//!
//! The engine owns no mutable state. Every resource is injected at
//! construction and shared read-only across requests and worker threads.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::features::{FeatureBuilder, FeatureOutput, FeatureVector};
use crate::models::{JobPosting, StudentProfile};
use crate::ranker::training::TrainingExample;
use crate::ranker::{select_scores, LinearScorer, RankingModel, ScoreSelection};
use crate::skills::{LooseMatchPolicy, SkillNormalizer};

/// Score ranges narrower than this normalize to a flat 50.
const FLAT_RANGE_EPSILON: f64 = 1e-9;
const FLAT_MATCH_PERCENT: f64 = 50.0;

pub const DEFAULT_PARALLEL_MIN_JOBS: usize = 8;

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("at least one job is required")]
    EmptyJobList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub score: f64,
    pub match_percent: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub used_learned_model: bool,
    pub results: Vec<RankedResult>,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

pub struct RecommendationEngine {
    embedder: Arc<dyn Embedder>,
    skills: Arc<SkillNormalizer>,
    learned: Arc<dyn RankingModel>,
    linear: LinearScorer,
    builder: FeatureBuilder,
    parallel_min_jobs: usize,
}

impl RecommendationEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        skills: Arc<SkillNormalizer>,
        learned: Arc<dyn RankingModel>,
    ) -> Self {
        Self {
            embedder,
            skills,
            learned,
            linear: LinearScorer::default(),
            builder: FeatureBuilder::default(),
            parallel_min_jobs: DEFAULT_PARALLEL_MIN_JOBS,
        }
    }

    pub fn with_loose_match(mut self, policy: LooseMatchPolicy) -> Self {
        self.builder = FeatureBuilder::new(policy);
        self
    }

    pub fn with_parallel_min_jobs(mut self, min_jobs: usize) -> Self {
        self.parallel_min_jobs = min_jobs.max(1);
        self
    }

    pub fn learned_available(&self) -> bool {
        self.learned.available()
    }

    pub fn learned_name(&self) -> &'static str {
        self.learned.name()
    }

    /// Ranks `jobs` for `student`. Only an empty job list is rejected; any
    /// malformed field inside a job degrades to a neutral feature value.
    pub fn recommend(
        &self,
        student: &StudentProfile,
        jobs: &[JobPosting],
    ) -> Result<Recommendation, RecommendError> {
        if jobs.is_empty() {
            return Err(RecommendError::EmptyJobList);
        }

        let student = self.prepare_student(student);
        let student_vec = self.student_vector(&student);

        let score_job = |job: &JobPosting| self.pair_output(&student, &student_vec, job);
        let outputs: Vec<FeatureOutput> = if jobs.len() >= self.parallel_min_jobs {
            jobs.par_iter().map(score_job).collect()
        } else {
            jobs.iter().map(score_job).collect()
        };

        let rows: Vec<FeatureVector> = outputs.iter().map(|o| o.vector).collect();
        let selection = self.score_rows(&rows);
        let percents = normalize_match_percent(&selection.scores);

        let mut results: Vec<RankedResult> = jobs
            .iter()
            .zip(outputs)
            .zip(selection.scores.iter().zip(percents))
            .map(|((job, output), (&score, match_percent))| RankedResult {
                job_id: job.id.clone(),
                title: job.title.clone(),
                company: job.company.clone(),
                score,
                match_percent,
                reasons: output.reasons,
            })
            .collect();

        // stable: equal scores keep job input order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            student_id = %student.id,
            jobs = jobs.len(),
            backend = if selection.used_learned_model { self.learned.name() } else { "linear" },
            top = results.first().map(|r| r.score),
            "Recommendation computed"
        );

        Ok(Recommendation {
            used_learned_model: selection.used_learned_model,
            results,
        })
    }

    /// Feature vector and reasons for one pair, with the same skill
    /// canonicalization `recommend` applies. Embeddings are taken as given.
    pub fn build_features(
        &self,
        student: &StudentProfile,
        job: &JobPosting,
        student_vec: Option<&[f32]>,
        job_vec: Option<&[f32]>,
    ) -> FeatureOutput {
        let student = self.prepare_student(student);
        let job = self.prepare_job(job);
        self.builder.build(&student, &job, student_vec, job_vec)
    }

    /// One labelled row for the training CSV, embedded and canonicalized the
    /// way `recommend` treats the same pair.
    pub fn training_example(
        &self,
        student: &StudentProfile,
        job: &JobPosting,
        label: f64,
    ) -> TrainingExample {
        let student = self.prepare_student(student);
        let student_vec = self.student_vector(&student);
        TrainingExample {
            student_id: student.id.clone(),
            features: self.pair_output(&student, &student_vec, job).vector,
            label,
        }
    }

    /// Scores prebuilt rows with the learned model or the linear fallback.
    pub fn score_rows(&self, rows: &[FeatureVector]) -> ScoreSelection {
        select_scores(self.learned.as_ref(), &self.linear, rows)
    }

    /// Builds one job's features against an already prepared student.
    fn pair_output(
        &self,
        student: &StudentProfile,
        student_vec: &[f32],
        job: &JobPosting,
    ) -> FeatureOutput {
        let job = self.prepare_job(job);
        let job_vec = self.vector_for(job.embedding.as_deref(), &job.embedding_text());
        self.builder
            .build(student, &job, Some(student_vec), Some(job_vec.as_slice()))
    }

    fn student_vector(&self, student: &StudentProfile) -> Vec<f32> {
        self.vector_for(student.embedding.as_deref(), &student.resume_text)
    }

    fn prepare_student(&self, student: &StudentProfile) -> StudentProfile {
        let mut student = student.clone().cleaned();
        student.skills = if student.skills.is_empty() {
            self.skills.extract_from_text(&student.body_text())
        } else {
            self.skills.canonicalize(&student.skills)
        };
        student
    }

    fn prepare_job(&self, job: &JobPosting) -> JobPosting {
        let mut job = job.clone();
        if job.has_no_skills() {
            job.skills = self.skills.extract_from_text(&job.body_text());
        } else {
            job.skills = self.skills.canonicalize(&job.skills);
            job.related_skills = self.skills.canonicalize(&job.related_skills);
            job.tools = self.skills.canonicalize(&job.tools);
        }
        job
    }

    /// A precomputed vector when it matches the embedder width, else a fresh one.
    fn vector_for(&self, precomputed: Option<&[f32]>, text: &str) -> Vec<f32> {
        match precomputed {
            Some(v) if v.len() == self.embedder.dimension() => v.to_vec(),
            _ => self.embedder.embed(text),
        }
    }
}

/// Min-max scales raw scores to 0–100 across the batch. A range below
/// `FLAT_RANGE_EPSILON` maps every score to 50.
pub fn normalize_match_percent(scores: &[f64]) -> Vec<f64> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };
    let (min, max) = scores
        .iter()
        .fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = max - min;
    if !range.is_finite() || range < FLAT_RANGE_EPSILON {
        return vec![FLAT_MATCH_PERCENT; scores.len()];
    }
    scores.iter().map(|&s| (s - min) / range * 100.0).collect()
}
