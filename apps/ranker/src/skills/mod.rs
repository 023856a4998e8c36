// Skill handling: canonicalization against the alias map, token normalization,
// and the loose-match policy used for coverage features.

pub mod loose_match;
pub mod normalizer;

pub use loose_match::LooseMatchPolicy;
pub use normalizer::SkillNormalizer;

/// Canonical comparison form of a skill: lowercased, everything outside
/// `[a-z0-9]` stripped. "React.js" → "reactjs", "C++" → "c".
pub fn normalize_skill_token(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
