//! Feature Builder — turns a (student, job) pair into the fixed-width feature
//! vector plus explanation strings.
//!
//! `build` is total: every sub-computation maps absent or empty input to the
//! slot's neutral value (0.0). It does no I/O and keeps no state, so it can run
//! on any worker thread.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::embeddings::cosine_similarity;
use crate::features::domain::resolve_domains;
use crate::features::text::{required_years, token_set, value_text};
use crate::features::vector::{FeatureSlot, FeatureVector};
use crate::models::{JobPosting, StudentProfile};
use crate::skills::{normalize_skill_token, LooseMatchPolicy};

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

const STRONG_SIMILARITY: f64 = 0.55;
const MODERATE_SIMILARITY: f64 = 0.35;
const WEAK_SIMILARITY: f64 = 0.20;
const LOW_SIMILARITY: f64 = 0.30;
const TITLE_OVERLAP_REASON: f64 = 0.5;
const ROLE_MATCH_REASON: f64 = 0.5;
const STRONG_GPA: f64 = 8.0;

pub const NO_HIGHLIGHTS: &str = "No highlights available for this match.";

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureOutput {
    pub vector: FeatureVector,
    /// Never empty. Non-authoritative for scoring.
    pub reasons: Vec<String>,
}

/// Outcome of matching one job skill list against the student's skills.
#[derive(Debug, Default)]
struct Coverage {
    total: usize,
    /// Display names of matched job skills, sorted.
    matched: BTreeSet<String>,
}

impl Coverage {
    /// sqrt(matched / total); 0 when the list is empty.
    fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.matched.len() as f64 / self.total as f64).sqrt()
    }

    /// Share of the list left unmatched; 0 when the list is empty.
    fn missing_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.matched.len()) as f64 / self.total as f64
    }

    fn joined(&self) -> String {
        self.matched.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder {
    policy: LooseMatchPolicy,
}

impl FeatureBuilder {
    pub fn new(policy: LooseMatchPolicy) -> Self {
        Self { policy }
    }

    /// Builds the feature vector and reasons for one pair.
    ///
    /// Skill lists are expected to be canonicalized already; they are reduced
    /// to `[a-z0-9]` tokens here before loose matching.
    pub fn build(
        &self,
        student: &StudentProfile,
        job: &JobPosting,
        student_vec: Option<&[f32]>,
        job_vec: Option<&[f32]>,
    ) -> FeatureOutput {
        let mut vector = FeatureVector::zeros();
        let mut reasons = Vec::new();

        // 0: semantic similarity
        let sim = cosine_similarity(student_vec, job_vec);
        vector.set(FeatureSlot::SemanticSimilarity, sim);
        if sim > STRONG_SIMILARITY {
            reasons.push("Strong semantic similarity with the job description.".to_string());
        } else if sim > MODERATE_SIMILARITY {
            reasons.push("Moderate semantic match to the job description.".to_string());
        } else if sim > WEAK_SIMILARITY {
            reasons.push("Weak semantic similarity to the job description.".to_string());
        }

        // 1–4: skill coverage
        let student_tokens = skill_tokens(&student.skills);
        let required = self.coverage(&job.skills, &student_tokens);
        let related = self.coverage(&job.related_skills, &student_tokens);
        let tools = self.coverage(&job.tools, &student_tokens);

        vector.set(FeatureSlot::RequiredSkillCoverage, required.score());
        vector.set(FeatureSlot::RelatedSkillCoverage, related.score());
        vector.set(FeatureSlot::ToolOverlap, tools.score());
        vector.set(FeatureSlot::MissingRequiredPenalty, required.missing_ratio());

        if !required.matched.is_empty() {
            reasons.push(format!("Matching required skills: {}", required.joined()));
        }
        if !related.matched.is_empty() {
            reasons.push(format!("Matching related skills: {}", related.joined()));
        }
        if !tools.matched.is_empty() {
            reasons.push(format!("Matching tools: {}", tools.joined()));
        }

        // 5: domain match
        let shared = shared_domains(student, job);
        if let Some(first) = shared.iter().next() {
            vector.set(FeatureSlot::DomainMatch, 1.0);
            reasons.push(format!("This role matches your preferred domain: {first}."));
        }

        if branch_matches(student.branch.as_deref(), job.branch.as_deref()) {
            reasons.push("Your branch matches the preferred branch.".to_string());
        }

        // 6–7: title terms
        let title_tokens = token_set(&job.title);
        let title_overlap = title_term_overlap(&title_tokens, student, &student_tokens);
        vector.set(FeatureSlot::TitleTermOverlap, title_overlap);
        if title_overlap >= TITLE_OVERLAP_REASON {
            reasons.push("Your resume mentions the key terms of this job title.".to_string());
        }

        let role_match = role_title_match(&title_tokens, &student.positions);
        vector.set(FeatureSlot::RoleTitleMatch, role_match);
        if role_match >= ROLE_MATCH_REASON {
            reasons.push("You have held a similar role before.".to_string());
        }

        // 8: education
        let education = education_match(job.education_requirement.as_deref(), &student.education);
        vector.set(FeatureSlot::EducationMatch, education);
        if education > 0.0 {
            reasons.push("Your education matches the stated requirement.".to_string());
        }

        // 9: experience
        let years = job.experience_requirement.as_deref().and_then(required_years);
        let experience = experience_match(years, student.experience.len());
        vector.set(FeatureSlot::ExperienceMatch, experience);
        match years {
            Some(n) if experience >= 1.0 => {
                reasons.push(format!("Your experience meets the {n}+ year requirement."));
            }
            None if experience > 0.0 => {
                reasons.push("Your resume includes prior experience.".to_string());
            }
            _ => {}
        }

        // 10: GPA
        let gpa = student.gpa_value();
        vector.set(FeatureSlot::GpaNormalized, gpa / 10.0);
        if gpa >= STRONG_GPA {
            reasons.push(format!("Strong academic record (GPA {gpa:.1}/10)."));
        }

        if reasons.is_empty() {
            reasons = fallback_reasons(sim, &student_tokens, [&required, &related, &tools]);
        }

        FeatureOutput { vector, reasons }
    }

    /// Matches a job skill list against the student's tokens. Each job skill is
    /// counted once, keyed by its normalized token; the first spelling is shown.
    fn coverage(&self, job_skills: &[String], student_tokens: &BTreeSet<String>) -> Coverage {
        let mut by_token: BTreeMap<String, &str> = BTreeMap::new();
        for raw in job_skills {
            let token = normalize_skill_token(raw);
            if !token.is_empty() {
                by_token.entry(token).or_insert(raw.trim());
            }
        }

        let matched = by_token
            .iter()
            .filter(|(token, _)| {
                student_tokens
                    .iter()
                    .any(|s| self.policy.matches(s, token))
            })
            .map(|(_, display)| display.to_string())
            .collect();

        Coverage {
            total: by_token.len(),
            matched,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-computations (each total over its inputs)
// ────────────────────────────────────────────────────────────────────────────

fn skill_tokens(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| normalize_skill_token(s))
        .filter(|t| !t.is_empty())
        .collect()
}

fn shared_domains(student: &StudentProfile, job: &JobPosting) -> BTreeSet<String> {
    let student_domains: BTreeSet<String> = resolve_domains(
        &student.declared_domains(),
        &student.body_text(),
        &student.skills,
    )
    .into_iter()
    .collect();

    let job_skills: Vec<String> = job
        .skills
        .iter()
        .chain(&job.related_skills)
        .chain(&job.tools)
        .cloned()
        .collect();
    let job_domains: BTreeSet<String> =
        resolve_domains(&job.declared_domains(), &job.body_text(), &job_skills)
            .into_iter()
            .collect();

    student_domains
        .intersection(&job_domains)
        .cloned()
        .collect()
}

fn branch_matches(student: Option<&str>, job: Option<&str>) -> bool {
    match (student, job) {
        (Some(s), Some(j)) => {
            let (s, j) = (s.trim().to_lowercase(), j.trim().to_lowercase());
            !s.is_empty() && !j.is_empty() && (s.contains(&j) || j.contains(&s))
        }
        _ => false,
    }
}

/// Share of title tokens found in the resume and responsibilities text or among
/// the student's skills.
fn title_term_overlap(
    title_tokens: &BTreeSet<String>,
    student: &StudentProfile,
    student_skill_tokens: &BTreeSet<String>,
) -> f64 {
    if title_tokens.is_empty() {
        return 0.0;
    }
    let resume_tokens = token_set(&student.body_text());
    let hits = title_tokens
        .iter()
        .filter(|t| {
            resume_tokens.contains(*t) || student_skill_tokens.contains(&normalize_skill_token(t))
        })
        .count();
    (hits as f64 / title_tokens.len() as f64).min(1.0)
}

/// Share of title tokens that appear in any prior position title.
fn role_title_match(title_tokens: &BTreeSet<String>, positions: &[String]) -> f64 {
    if title_tokens.is_empty() || positions.is_empty() {
        return 0.0;
    }
    let position_tokens: BTreeSet<String> = positions.iter().flat_map(|p| token_set(p)).collect();
    if position_tokens.is_empty() {
        return 0.0;
    }
    let hits = title_tokens
        .iter()
        .filter(|t| position_tokens.contains(*t))
        .count();
    (hits as f64 / title_tokens.len() as f64).min(1.0)
}

/// 1.0 if the requirement text shares a token with the student's education entries.
fn education_match(requirement: Option<&str>, education: &[serde_json::Value]) -> f64 {
    let Some(requirement) = requirement else {
        return 0.0;
    };
    let required = token_set(requirement);
    if required.is_empty() || education.is_empty() {
        return 0.0;
    }
    let text = education.iter().map(value_text).collect::<Vec<_>>().join(" ");
    let held = token_set(&text);
    if required.intersection(&held).next().is_some() {
        1.0
    } else {
        0.0
    }
}

/// With a year requirement N: min(entries / max(N, 1), 1). Without one: 1.0 if
/// the student lists any experience, else 0.
fn experience_match(required_years: Option<u32>, entries: usize) -> f64 {
    match required_years {
        Some(n) => (entries as f64 / f64::from(n.max(1))).min(1.0),
        None if entries > 0 => 1.0,
        None => 0.0,
    }
}

fn fallback_reasons(sim: f64, student_tokens: &BTreeSet<String>, lists: [&Coverage; 3]) -> Vec<String> {
    let mut reasons = Vec::new();
    let job_has_skills = lists.iter().any(|c| c.total > 0);
    let any_match = lists.iter().any(|c| !c.matched.is_empty());

    if student_tokens.is_empty() {
        reasons.push("No skills were extracted from your resume.".to_string());
    }
    if !job_has_skills {
        reasons.push("This job listing has no skills data.".to_string());
    }
    if sim < LOW_SIMILARITY {
        reasons.push("Low semantic similarity between your resume and this job.".to_string());
    }
    if !student_tokens.is_empty() && job_has_skills && !any_match {
        reasons.push("No matching skills found between your profile and this job.".to_string());
    }
    if reasons.is_empty() {
        reasons.push(NO_HIGHLIGHTS.to_string());
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn builder() -> FeatureBuilder {
        FeatureBuilder::default()
    }

    fn react_student() -> StudentProfile {
        StudentProfile {
            id: "s1".to_string(),
            resume_text: "Frontend developer".to_string(),
            skills: strings(&["react", "node.js"]),
            gpa: Some(8.0),
            ..Default::default()
        }
    }

    fn fullstack_job() -> JobPosting {
        JobPosting {
            id: "j1".to_string(),
            title: "Full Stack Intern".to_string(),
            description: "Build web apps".to_string(),
            skills: strings(&["react", "nodejs", "aws"]),
            ..Default::default()
        }
    }

    fn assert_all_slots_valid(v: &FeatureVector) {
        for &x in v.as_slice() {
            assert!(x.is_finite(), "non-finite slot in {v:?}");
            assert!((0.0..=1.0).contains(&x), "slot out of range in {v:?}");
        }
    }

    #[test]
    fn test_required_skill_scenario() {
        let out = builder().build(&react_student(), &fullstack_job(), None, None);
        let v = out.vector;

        let expected_cov = (2.0_f64 / 3.0).sqrt();
        assert!((v.get(FeatureSlot::RequiredSkillCoverage) - expected_cov).abs() < 1e-12);
        assert!((v.get(FeatureSlot::MissingRequiredPenalty) - 1.0 / 3.0).abs() < 1e-12);
        assert!((v.get(FeatureSlot::GpaNormalized) - 0.8).abs() < 1e-12);
        assert!(out
            .reasons
            .contains(&"Matching required skills: nodejs, react".to_string()));
    }

    #[test]
    fn test_empty_inputs_are_neutral_and_finite() {
        let out = builder().build(&StudentProfile::default(), &JobPosting::default(), None, None);
        assert_all_slots_valid(&out.vector);
        assert_eq!(out.vector, FeatureVector::zeros());
        assert!(!out.reasons.is_empty());
    }

    #[test]
    fn test_absent_embeddings_give_zero_similarity() {
        let out = builder().build(&react_student(), &fullstack_job(), None, Some(&[1.0_f32, 0.0][..]));
        assert_eq!(out.vector.get(FeatureSlot::SemanticSimilarity), 0.0);
    }

    #[test]
    fn test_negative_cosine_clamps_to_zero() {
        let a = [1.0_f32, 0.0];
        let b = [-1.0_f32, 0.0];
        let out = builder().build(&react_student(), &fullstack_job(), Some(&a[..]), Some(&b[..]));
        assert_eq!(out.vector.get(FeatureSlot::SemanticSimilarity), 0.0);
    }

    #[test]
    fn test_similarity_tier_reasons() {
        let a = [1.0_f32, 0.0];
        let out = builder().build(&StudentProfile::default(), &JobPosting::default(), Some(&a[..]), Some(&a[..]));
        assert_eq!(out.vector.get(FeatureSlot::SemanticSimilarity), 1.0);
        assert!(out.reasons[0].starts_with("Strong semantic similarity"));
    }

    #[test]
    fn test_related_and_tool_coverage() {
        let student = StudentProfile {
            skills: strings(&["docker", "pandas"]),
            ..Default::default()
        };
        let job = JobPosting {
            related_skills: strings(&["pandas", "numpy"]),
            tools: strings(&["Docker", "Jira", "Git", "Figma"]),
            ..Default::default()
        };
        let v = builder().build(&student, &job, None, None).vector;
        assert!((v.get(FeatureSlot::RelatedSkillCoverage) - 0.5_f64.sqrt()).abs() < 1e-12);
        assert!((v.get(FeatureSlot::ToolOverlap) - 0.25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(v.get(FeatureSlot::RequiredSkillCoverage), 0.0);
        assert_eq!(v.get(FeatureSlot::MissingRequiredPenalty), 0.0);
    }

    #[test]
    fn test_duplicate_job_skills_count_once() {
        let job = JobPosting {
            skills: strings(&["React", "react", "React.js"]),
            ..Default::default()
        };
        let v = builder().build(&react_student(), &job, None, None).vector;
        // "react" and "reactjs" are distinct tokens, both loosely matched
        assert_eq!(v.get(FeatureSlot::RequiredSkillCoverage), 1.0);
        assert_eq!(v.get(FeatureSlot::MissingRequiredPenalty), 0.0);
    }

    #[test]
    fn test_domain_match_from_inference() {
        let student = StudentProfile {
            resume_text: "Android developer shipping Kotlin apps".to_string(),
            ..Default::default()
        };
        let job = JobPosting {
            title: "Mobile Engineer".to_string(),
            description: "Flutter and iOS".to_string(),
            ..Default::default()
        };
        let out = builder().build(&student, &job, None, None);
        assert_eq!(out.vector.get(FeatureSlot::DomainMatch), 1.0);
        assert!(out
            .reasons
            .contains(&"This role matches your preferred domain: mobile.".to_string()));
    }

    #[test]
    fn test_declared_domains_disjoint_is_zero() {
        let student = StudentProfile {
            domains: strings(&["data"]),
            ..Default::default()
        };
        let job = JobPosting {
            domain: Some("web".to_string()),
            ..Default::default()
        };
        let v = builder().build(&student, &job, None, None).vector;
        assert_eq!(v.get(FeatureSlot::DomainMatch), 0.0);
    }

    #[test]
    fn test_title_and_role_overlap() {
        let student = StudentProfile {
            resume_text: "Backend developer with Go".to_string(),
            positions: strings(&["Backend Intern"]),
            ..Default::default()
        };
        let job = JobPosting {
            title: "Backend Developer Intern".to_string(),
            ..Default::default()
        };
        let v = builder().build(&student, &job, None, None).vector;
        // title tokens: backend, developer, intern
        assert!((v.get(FeatureSlot::TitleTermOverlap) - 2.0 / 3.0).abs() < 1e-12);
        assert!((v.get(FeatureSlot::RoleTitleMatch) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_title_overlap_counts_skill_tokens() {
        let student = StudentProfile {
            skills: strings(&["React"]),
            ..Default::default()
        };
        let job = JobPosting {
            title: "React".to_string(),
            ..Default::default()
        };
        let v = builder().build(&student, &job, None, None).vector;
        assert_eq!(v.get(FeatureSlot::TitleTermOverlap), 1.0);
    }

    #[test]
    fn test_student_responsibilities_feed_title_and_domain() {
        let job = JobPosting {
            title: "Mobile Lead".to_string(),
            description: "Flutter and iOS".to_string(),
            ..Default::default()
        };
        let mut student = StudentProfile {
            resume_text: "Computer science graduate".to_string(),
            ..Default::default()
        };
        let before = builder().build(&student, &job, None, None).vector;
        assert_eq!(before.get(FeatureSlot::TitleTermOverlap), 0.0);
        assert_eq!(before.get(FeatureSlot::DomainMatch), 0.0);

        student.responsibilities = "Lead for the Android app, shipping Kotlin releases".to_string();
        let after = builder().build(&student, &job, None, None).vector;
        // title tokens: mobile, lead
        assert!((after.get(FeatureSlot::TitleTermOverlap) - 0.5).abs() < 1e-12);
        assert_eq!(after.get(FeatureSlot::DomainMatch), 1.0);
    }

    #[test]
    fn test_education_match() {
        let student = StudentProfile {
            education: vec![json!({ "degree": "B.Tech", "field": "Computer Science" })],
            ..Default::default()
        };
        let job = JobPosting {
            education_requirement: Some("Bachelor's in Computer Science".to_string()),
            ..Default::default()
        };
        let out = builder().build(&student, &job, None, None);
        assert_eq!(out.vector.get(FeatureSlot::EducationMatch), 1.0);

        let no_req = builder().build(&student, &JobPosting::default(), None, None);
        assert_eq!(no_req.vector.get(FeatureSlot::EducationMatch), 0.0);
    }

    #[test]
    fn test_experience_with_year_requirement() {
        let student = StudentProfile {
            experience: vec![json!("Intern at Acme")],
            ..Default::default()
        };
        let job = JobPosting {
            experience_requirement: Some("2+ years".to_string()),
            ..Default::default()
        };
        let v = builder().build(&student, &job, None, None).vector;
        assert_eq!(v.get(FeatureSlot::ExperienceMatch), 0.5);
    }

    #[test]
    fn test_experience_without_requirement() {
        assert_eq!(experience_match(None, 0), 0.0);
        assert_eq!(experience_match(None, 3), 1.0);
        assert_eq!(experience_match(Some(0), 1), 1.0);
        assert_eq!(experience_match(Some(4), 1), 0.25);
        assert_eq!(experience_match(Some(1), 5), 1.0);
    }

    #[test]
    fn test_branch_reason() {
        let student = StudentProfile {
            branch: Some("Computer Science and Engineering".to_string()),
            ..Default::default()
        };
        let job = JobPosting {
            branch: Some("computer science".to_string()),
            ..Default::default()
        };
        let out = builder().build(&student, &job, None, None);
        assert!(out
            .reasons
            .contains(&"Your branch matches the preferred branch.".to_string()));
    }

    #[test]
    fn test_fallback_reasons_when_nothing_positive() {
        let student = StudentProfile {
            skills: strings(&["cobol"]),
            ..Default::default()
        };
        let job = JobPosting {
            skills: strings(&["rust"]),
            ..Default::default()
        };
        let out = builder().build(&student, &job, None, None);
        assert_eq!(
            out.reasons,
            vec![
                "Low semantic similarity between your resume and this job.".to_string(),
                "No matching skills found between your profile and this job.".to_string(),
            ]
        );
    }

    #[test]
    fn test_fallback_reports_missing_skills_on_both_sides() {
        let out = builder().build(&StudentProfile::default(), &JobPosting::default(), None, None);
        assert_eq!(out.reasons[0], "No skills were extracted from your resume.");
        assert_eq!(out.reasons[1], "This job listing has no skills data.");
    }

    #[test]
    fn test_reasons_are_deterministic() {
        let student = react_student();
        let job = fullstack_job();
        let first = builder().build(&student, &job, None, None);
        for _ in 0..10 {
            assert_eq!(builder().build(&student, &job, None, None), first);
        }
    }

    #[test]
    fn test_short_token_guard_changes_coverage() {
        let student = StudentProfile {
            skills: strings(&["c"]),
            ..Default::default()
        };
        let job = JobPosting {
            skills: strings(&["css"]),
            ..Default::default()
        };
        let permissive = builder().build(&student, &job, None, None).vector;
        let guarded = FeatureBuilder::new(LooseMatchPolicy::new(2))
            .build(&student, &job, None, None)
            .vector;
        assert_eq!(permissive.get(FeatureSlot::RequiredSkillCoverage), 1.0);
        assert_eq!(guarded.get(FeatureSlot::RequiredSkillCoverage), 0.0);
    }
}
