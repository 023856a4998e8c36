//! Skill canonicalization: raw skill strings to canonical skill tokens.
//!
//! The alias table comes from a JSON object `{ "alias": "canonical" }` or
//! `{ "alias": ["canonical", ...] }`. When no file is configured a small built-in
//! table is used. Unknown skills pass through lowercased and trimmed.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::features::text::contains_term;

#[derive(Debug, Error)]
pub enum SkillMapError {
    #[error("failed to read skill map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("skill map is not a valid alias object: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillTarget {
    One(String),
    Many(Vec<String>),
}

/// Built-in aliases used when no skill map file is present.
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "java script", "ecmascript", "es6"]),
    ("typescript", &["ts", "type script"]),
    ("nodejs", &["node.js", "node js", "node"]),
    ("react", &["reactjs", "react.js", "react js"]),
    ("nextjs", &["next.js", "next js"]),
    ("vue", &["vue.js", "vuejs", "vue js"]),
    ("angular", &["angularjs", "angular.js"]),
    ("express", &["express.js", "expressjs"]),
    ("reactnative", &["react native", "react-native"]),
    ("css", &["css3"]),
    ("html", &["html5"]),
    ("tailwind", &["tailwindcss", "tailwind css"]),
    ("spring", &["spring boot", "springboot"]),
    ("django", &["django rest framework", "drf"]),
    ("fastapi", &["fast api"]),
    ("postgresql", &["postgres", "postgre sql"]),
    ("mysql", &["my sql", "mariadb"]),
    ("mongodb", &["mongo", "mongo db"]),
    ("aws", &["amazon web services", "amazon aws"]),
    ("gcp", &["google cloud platform", "google cloud"]),
    ("azure", &["microsoft azure", "ms azure"]),
    ("kubernetes", &["k8s"]),
    ("cicd", &["ci/cd", "ci cd"]),
    ("python", &["python3", "python 3"]),
    ("cpp", &["c++"]),
    ("csharp", &["c#"]),
    ("golang", &["go lang"]),
    ("machinelearning", &["machine learning"]),
    ("scikitlearn", &["scikit-learn", "sklearn", "scikit learn"]),
    ("tensorflow", &["tensor flow"]),
    ("pytorch", &["torch"]),
];

#[derive(Debug, Clone, Default)]
pub struct SkillNormalizer {
    /// Lowercased alias → canonical targets. Ordered so text extraction is deterministic.
    aliases: BTreeMap<String, Vec<String>>,
}

impl SkillNormalizer {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_ALIASES.iter().flat_map(|(canonical, aliases)| {
            aliases
                .iter()
                .chain(std::iter::once(canonical))
                .map(move |alias| (alias.to_string(), vec![canonical.to_string()]))
        }))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let aliases = pairs
            .into_iter()
            .filter_map(|(alias, targets)| {
                let key = alias.trim().to_lowercase();
                let targets: Vec<String> = targets
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                (!key.is_empty() && !targets.is_empty()).then_some((key, targets))
            })
            .collect();
        Self { aliases }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SkillMapError> {
        let raw: BTreeMap<String, SkillTarget> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(raw.into_iter().map(|(alias, target)| {
            let targets = match target {
                SkillTarget::One(t) => vec![t],
                SkillTarget::Many(ts) => ts,
            };
            (alias, targets)
        })))
    }

    pub fn load(path: &Path) -> Result<Self, SkillMapError> {
        let json = std::fs::read_to_string(path).map_err(|source| SkillMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Loads the skill map at `path`, using the built-in table when the file is
    /// absent or unreadable.
    pub fn load_or_builtin(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No skill map found, using built-in aliases");
            return Self::builtin();
        }
        match Self::load(path) {
            Ok(normalizer) if normalizer.is_empty() => {
                warn!(path = %path.display(), "Skill map has no aliases, using built-in aliases");
                Self::builtin()
            }
            Ok(normalizer) => {
                info!(path = %path.display(), aliases = normalizer.len(), "Skill map loaded");
                normalizer
            }
            Err(e) => {
                warn!(error = %e, "Skill map unusable, using built-in aliases");
                Self::builtin()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Maps each raw skill to its canonical form(s), deduplicated in first-seen order.
    pub fn canonicalize(&self, raw: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for skill in raw {
            let key = skill.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            match self.aliases.get(&key) {
                Some(targets) => out.extend(targets.iter().cloned()),
                None => out.push(key),
            }
        }
        out.retain(|s| seen.insert(s.clone()));
        out
    }

    /// Canonical skills whose aliases occur as whole terms in `text`.
    pub fn extract_from_text(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        if lowered.trim().is_empty() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        self.aliases
            .iter()
            .filter(|(alias, _)| contains_term(&lowered, alias))
            .flat_map(|(_, targets)| targets.iter().cloned())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_skills_pass_through_lowercased() {
        let n = SkillNormalizer::empty();
        assert_eq!(n.canonicalize(&strings(&[" Rust ", "GraphQL"])), vec!["rust", "graphql"]);
    }

    #[test]
    fn test_aliases_resolve_and_dedupe() {
        let n = SkillNormalizer::builtin();
        assert_eq!(
            n.canonicalize(&strings(&["React.js", "reactjs", "Node.js", "k8s"])),
            vec!["react", "nodejs", "kubernetes"]
        );
    }

    #[test]
    fn test_json_map_supports_lists() {
        let n = SkillNormalizer::from_json_str(
            r#"{ "MERN": ["mongodb", "express", "react", "nodejs"], "Py": "python" }"#,
        )
        .unwrap();
        assert_eq!(
            n.canonicalize(&strings(&["mern", "py"])),
            vec!["mongodb", "express", "react", "nodejs", "python"]
        );
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            SkillNormalizer::from_json_str("[1, 2]"),
            Err(SkillMapError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "golang": "go" }}"#).unwrap();
        let n = SkillNormalizer::load(file.path()).unwrap();
        assert_eq!(n.canonicalize(&strings(&["GoLang"])), vec!["go"]);
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let n = SkillNormalizer::load_or_builtin(Path::new("/nonexistent/skill_map.json"));
        assert!(!n.is_empty());
    }

    #[test]
    fn test_empty_map_file_falls_back_to_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        let n = SkillNormalizer::load_or_builtin(file.path());
        assert_eq!(n.len(), SkillNormalizer::builtin().len());
    }

    #[test]
    fn test_extract_from_text_matches_whole_terms() {
        let n = SkillNormalizer::builtin();
        let found = n.extract_from_text("We use React and NodeJS on AWS; JSON APIs.");
        assert_eq!(found, vec!["aws", "nodejs", "react"]);
    }

    #[test]
    fn test_extract_from_empty_text() {
        assert!(SkillNormalizer::builtin().extract_from_text("   ").is_empty());
    }
}
