use serde::{Deserialize, Serialize};

/// Width of every feature vector; the training CSV and the persisted ranker
/// are built against this slot order.
pub const FEATURE_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSlot {
    SemanticSimilarity,
    RequiredSkillCoverage,
    RelatedSkillCoverage,
    ToolOverlap,
    MissingRequiredPenalty,
    DomainMatch,
    TitleTermOverlap,
    RoleTitleMatch,
    EducationMatch,
    ExperienceMatch,
    GpaNormalized,
}

impl FeatureSlot {
    pub const ALL: [FeatureSlot; FEATURE_COUNT] = [
        FeatureSlot::SemanticSimilarity,
        FeatureSlot::RequiredSkillCoverage,
        FeatureSlot::RelatedSkillCoverage,
        FeatureSlot::ToolOverlap,
        FeatureSlot::MissingRequiredPenalty,
        FeatureSlot::DomainMatch,
        FeatureSlot::TitleTermOverlap,
        FeatureSlot::RoleTitleMatch,
        FeatureSlot::EducationMatch,
        FeatureSlot::ExperienceMatch,
        FeatureSlot::GpaNormalized,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    #[cfg(test)]
    pub fn name(self) -> &'static str {
        match self {
            FeatureSlot::SemanticSimilarity => "semantic_similarity",
            FeatureSlot::RequiredSkillCoverage => "required_skill_coverage",
            FeatureSlot::RelatedSkillCoverage => "related_skill_coverage",
            FeatureSlot::ToolOverlap => "tool_overlap",
            FeatureSlot::MissingRequiredPenalty => "missing_required_penalty",
            FeatureSlot::DomainMatch => "domain_match",
            FeatureSlot::TitleTermOverlap => "title_term_overlap",
            FeatureSlot::RoleTitleMatch => "role_title_match",
            FeatureSlot::EducationMatch => "education_match",
            FeatureSlot::ExperienceMatch => "experience_match",
            FeatureSlot::GpaNormalized => "gpa_normalized",
        }
    }
}

/// Fixed-width feature vector. Every slot holds a finite value in [0, 1];
/// `set` enforces it, so no caller can smuggle NaN into a scorer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Builds a vector from exactly `FEATURE_COUNT` values, sanitizing each.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        if values.len() != FEATURE_COUNT {
            return None;
        }
        let mut v = Self::zeros();
        for (slot, &value) in FeatureSlot::ALL.iter().zip(values) {
            v.set(*slot, value);
        }
        Some(v)
    }

    pub fn get(&self, slot: FeatureSlot) -> f64 {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: FeatureSlot, value: f64) {
        self.0[slot.index()] = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// JSON array in slot order, as in the `features` column of the training CSV.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}
