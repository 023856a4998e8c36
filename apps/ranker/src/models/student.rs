use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{embedding, entry_list, lenient_f64, lenient_string, lenient_text, string_list};

/// Upper bound of the GPA scale used throughout scoring.
pub const GPA_SCALE: f64 = 10.0;

/// A student as received from the profile service.
///
/// `skills` are raw, as authored; canonicalization happens in the engine.
/// `experience` and `education` entries are heterogeneous JSON (strings or
/// objects) and are only ever counted or flattened to text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub resume_text: String,
    #[serde(deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub branch: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub domains: Vec<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub gpa: Option<f64>,
    #[serde(deserialize_with = "entry_list")]
    pub experience: Vec<Value>,
    #[serde(deserialize_with = "entry_list")]
    pub education: Vec<Value>,
    #[serde(deserialize_with = "string_list")]
    pub positions: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub responsibilities: String,
    /// Precomputed resume embedding, used when its width matches the embedder.
    #[serde(deserialize_with = "embedding", skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl StudentProfile {
    /// GPA on the 0–10 scale. Missing or non-finite values are 0.
    pub fn gpa_value(&self) -> f64 {
        match self.gpa {
            Some(g) if g.is_finite() => g.clamp(0.0, GPA_SCALE),
            _ => 0.0,
        }
    }

    /// Returns the profile with its skill list trimmed and deduplicated
    /// case-insensitively (first spelling wins) and its GPA clamped.
    pub fn cleaned(mut self) -> Self {
        self.skills = dedupe_trimmed(self.skills);
        self.positions = dedupe_trimmed(self.positions);
        self.domains = self.declared_domains();
        self.gpa = Some(self.gpa_value());
        self
    }

    /// Resume and responsibilities text, read by domain inference, title-term
    /// overlap and skill extraction. Embeddings use the resume alone.
    pub fn body_text(&self) -> String {
        let resp = self.responsibilities.trim();
        if resp.is_empty() {
            return self.resume_text.clone();
        }
        format!("{} {}", self.resume_text, resp)
    }

    /// Declared domain tags, lowercased.
    pub fn declared_domains(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty() && seen.insert(d.clone()))
            .collect()
    }
}

fn dedupe_trimmed(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}
