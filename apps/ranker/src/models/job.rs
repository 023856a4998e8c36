use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{embedding, lenient_string, lenient_text, string_list};

/// A job posting as received from the listings service.
///
/// Every field degrades on its own: a wrong-typed value is dropped without
/// touching its siblings. Any of the three skill lists may be absent. `skills` doubles as the
/// required-skill list; the training exports call it `skills_required`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPosting {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(alias = "skills_required", deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(alias = "related_skills_in_job", deserialize_with = "string_list")]
    pub related_skills: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub tools: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub branch: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub domains: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub education_requirement: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub experience_requirement: Option<String>,
    #[serde(alias = "responsibilities_text", deserialize_with = "lenient_string")]
    pub responsibilities: Option<String>,
    /// Precomputed posting embedding, used when its width matches the embedder.
    #[serde(deserialize_with = "embedding", skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl JobPosting {
    /// Declared domain tags from both `domain` and `domains`, lowercased and unique.
    pub fn declared_domains(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.domains
            .iter()
            .map(String::as_str)
            .chain(self.domain.as_deref())
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty() && seen.insert(d.clone()))
            .collect()
    }

    /// True if none of the three skill lists carries anything.
    pub fn has_no_skills(&self) -> bool {
        self.skills.is_empty() && self.related_skills.is_empty() && self.tools.is_empty()
    }

    pub fn company_name(&self) -> &str {
        self.company.as_deref().unwrap_or("")
    }

    /// Title and description, the text domain inference and skill extraction read.
    pub fn body_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.description);
        if let Some(resp) = self.responsibilities.as_deref() {
            text.push(' ');
            text.push_str(resp);
        }
        text
    }

    /// Composite blob embedded for semantic similarity.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}. {}. Required skills: {}. Company: {}.",
            self.title,
            self.description,
            self.skills.join(", "),
            self.company_name()
        )
    }
}
