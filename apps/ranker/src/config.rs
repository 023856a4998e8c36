use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::embeddings::hash::DEFAULT_DIMENSION;
use crate::recommend::engine::DEFAULT_PARALLEL_MIN_JOBS;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Learned ranker artifact. A missing file means linear scoring only.
    pub ranker_model_path: PathBuf,
    /// Skill alias map. A missing file means the built-in aliases.
    pub skill_map_path: PathBuf,
    pub embedding_dimension: usize,
    /// Shortest token the containment and prefix loose-match rules apply to.
    pub loose_match_min_len: usize,
    /// Batches with at least this many jobs build features in parallel.
    pub rank_parallel_min_jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8000,
            rust_log: "info".to_string(),
            ranker_model_path: PathBuf::from("trained_models/ranker.json"),
            skill_map_path: PathBuf::from("skills/skill_map.json"),
            embedding_dimension: DEFAULT_DIMENSION,
            loose_match_min_len: 1,
            rank_parallel_min_jobs: DEFAULT_PARALLEL_MIN_JOBS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            ranker_model_path: lookup("RANKER_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ranker_model_path),
            skill_map_path: lookup("SKILL_MAP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.skill_map_path),
            embedding_dimension: parse_or("EMBEDDING_DIMENSION", &lookup, defaults.embedding_dimension)?,
            loose_match_min_len: parse_or("LOOSE_MATCH_MIN_LEN", &lookup, defaults.loose_match_min_len)?,
            rank_parallel_min_jobs: parse_or(
                "RANK_PARALLEL_MIN_JOBS",
                &lookup,
                defaults.rank_parallel_min_jobs,
            )?,
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.loose_match_min_len, 1);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9001"),
            ("RANKER_MODEL_PATH", "/models/r.json"),
            ("LOOSE_MATCH_MIN_LEN", "3"),
            ("EMBEDDING_DIMENSION", " 128 "),
        ]))
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.ranker_model_path, PathBuf::from("/models/r.json"));
        assert_eq!(config.loose_match_min_len, 3);
        assert_eq!(config.embedding_dimension, 128);
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
