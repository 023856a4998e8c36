//! Domain inference — maps free text or skill lists to coarse domain tags.
//!
//! Text is scored against weighted keyword lists with word-boundary matching.
//! Skill lists are scored by substring hits against a second keyword table, since
//! canonical skill tokens are often compounds ("reactnative", "nodejs").

use serde::{Deserialize, Serialize};

use crate::features::text::contains_term;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Web,
    Mobile,
    Cloud,
    Data,
    Security,
    Blockchain,
    Product,
    Embedded,
    Game,
}

impl Domain {
    /// Fixed enumeration order; also the tie-break order for equal scores.
    pub const ALL: [Domain; 9] = [
        Domain::Web,
        Domain::Mobile,
        Domain::Cloud,
        Domain::Data,
        Domain::Security,
        Domain::Blockchain,
        Domain::Product,
        Domain::Embedded,
        Domain::Game,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Web => "web",
            Domain::Mobile => "mobile",
            Domain::Cloud => "cloud",
            Domain::Data => "data",
            Domain::Security => "security",
            Domain::Blockchain => "blockchain",
            Domain::Product => "product",
            Domain::Embedded => "embedded",
            Domain::Game => "game",
        }
    }

    /// Weighted keywords looked up in free text. Broad words weigh less than
    /// stack-specific ones.
    fn text_keywords(self) -> &'static [(&'static str, f64)] {
        match self {
            Domain::Web => &[
                ("frontend", 1.0),
                ("backend", 1.0),
                ("full stack", 1.0),
                ("full-stack", 1.0),
                ("web", 0.5),
                ("react", 1.0),
                ("next", 0.5),
                ("angular", 1.0),
                ("vue", 1.0),
                ("svelte", 1.0),
                ("tailwind", 1.0),
                ("node.js", 1.0),
                ("typescript", 1.0),
                ("javascript", 1.0),
            ],
            Domain::Mobile => &[
                ("mobile", 1.0),
                ("android", 1.0),
                ("ios", 1.0),
                ("flutter", 1.0),
                ("react native", 1.5),
                ("react-native", 1.5),
                ("jetpack", 1.0),
                ("swiftui", 1.0),
                ("kotlin", 1.0),
                ("swift", 1.0),
            ],
            Domain::Cloud => &[
                ("cloud", 1.0),
                ("devops", 1.0),
                ("aws", 1.0),
                ("azure", 1.0),
                ("gcp", 1.0),
                ("kubernetes", 1.0),
                ("docker", 1.0),
                ("ci/cd", 1.0),
                ("terraform", 1.0),
                ("ansible", 1.0),
                ("helm", 1.0),
                ("sre", 1.0),
            ],
            Domain::Data => &[
                ("data", 0.5),
                ("machine learning", 1.5),
                ("ml", 1.0),
                ("analytics", 1.0),
                ("ai", 0.5),
                ("nlp", 1.0),
                ("llm", 1.0),
                ("pandas", 1.0),
                ("numpy", 1.0),
                ("pytorch", 1.0),
                ("tensorflow", 1.0),
                ("spark", 1.0),
            ],
            Domain::Security => &[
                ("security", 1.0),
                ("infosec", 1.0),
                ("owasp", 1.0),
                ("penetration", 1.0),
                ("pentest", 1.0),
                ("siem", 1.0),
                ("soc", 0.5),
                ("zero trust", 1.0),
                ("iam", 0.5),
            ],
            Domain::Blockchain => &[
                ("blockchain", 1.0),
                ("web3", 1.0),
                ("smart contract", 1.5),
                ("solidity", 1.0),
                ("defi", 1.0),
                ("crypto", 0.5),
                ("nft", 1.0),
            ],
            Domain::Product => &[
                ("ui", 0.5),
                ("ux", 0.5),
                ("design", 0.5),
                ("figma", 1.0),
                ("prototype", 1.0),
                ("wireframe", 1.0),
            ],
            Domain::Embedded => &[
                ("embedded", 1.0),
                ("firmware", 1.0),
                ("microcontroller", 1.0),
                ("arduino", 1.0),
                ("raspberry pi", 1.0),
                ("rtos", 1.0),
                ("iot", 1.0),
            ],
            Domain::Game => &[
                ("game", 1.0),
                ("unity", 1.0),
                ("unreal", 1.0),
                ("godot", 1.0),
            ],
        }
    }

    /// Keywords matched as substrings of canonical skill tokens.
    fn skill_keywords(self) -> &'static [&'static str] {
        match self {
            Domain::Web => &[
                "react", "next", "vue", "angular", "svelte", "tailwind", "css", "html",
                "javascript", "typescript", "node", "express", "django", "flask", "fastapi",
            ],
            Domain::Mobile => &[
                "reactnative", "react native", "flutter", "swift", "kotlin", "android", "ios",
            ],
            Domain::Cloud => &[
                "aws", "azure", "gcp", "kubernetes", "docker", "terraform", "ansible", "helm",
                "devops", "ci/cd", "cicd", "cloudwatch", "eks", "ecs",
            ],
            Domain::Data => &[
                "pandas", "numpy", "sklearn", "scikit", "tensorflow", "pytorch", "ml", "nlp",
                "llm", "langchain", "spark", "airflow", "dbt",
            ],
            Domain::Security => &[
                "owasp", "burp", "zap", "nessus", "siem", "soc", "iam", "kali", "nmap",
                "wireshark", "penetration",
            ],
            Domain::Blockchain => &[
                "solidity", "web3", "ethers", "hardhat", "truffle", "solana", "defi", "crypto",
                "nft",
            ],
            Domain::Product => &["figma", "adobe xd", "adobexd", "ui", "ux", "prototyping", "wireframe"],
            Domain::Embedded => &[
                "arduino", "raspberry", "embedded", "firmware", "rtos", "iot", "esp32", "stm32",
            ],
            Domain::Game => &["unity", "unreal", "godot", "blender"],
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domains with a positive keyword score in `text`, best first.
pub fn infer_from_text(text: &str) -> Vec<Domain> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let lowered = text.to_lowercase();
    rank(|domain| {
        domain
            .text_keywords()
            .iter()
            .filter(|(kw, _)| contains_term(&lowered, kw))
            .map(|(_, w)| w)
            .sum()
    })
}

/// Domains with at least one keyword hit in `skills`, best first.
pub fn infer_from_skills(skills: &[String]) -> Vec<Domain> {
    let lowered: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();
    if lowered.is_empty() {
        return Vec::new();
    }
    rank(|domain| {
        let hits = lowered
            .iter()
            .flat_map(|skill| {
                domain
                    .skill_keywords()
                    .iter()
                    .filter(move |kw| skill.contains(*kw))
            })
            .count();
        hits as f64
    })
}

/// Domain tags for one party: declared tags win; otherwise text inference,
/// falling back to skill inference when the text scores nothing.
pub fn resolve_domains(declared: &[String], text: &str, skills: &[String]) -> Vec<String> {
    if !declared.is_empty() {
        return declared.to_vec();
    }
    let mut inferred = infer_from_text(text);
    if inferred.is_empty() {
        inferred = infer_from_skills(skills);
    }
    inferred.into_iter().map(|d| d.as_str().to_string()).collect()
}

fn rank(score: impl Fn(Domain) -> f64) -> Vec<Domain> {
    let mut scored: Vec<(Domain, f64)> = Domain::ALL
        .iter()
        .map(|&d| (d, score(d)))
        .filter(|(_, s)| *s > 0.0)
        .collect();
    // stable: equal scores keep enumeration order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(d, _)| d).collect()
}
