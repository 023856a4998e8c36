/// Permissive equivalence test between two skill tokens.
///
/// Two tokens match if any of these hold:
/// - equal (after `_` → space and trimming)
/// - one contains the other
/// - equal once all whitespace is removed
/// - one is a prefix of the other
/// - their first whitespace-delimited words are equal
///
/// Every rule is symmetric, so `matches(a, b) == matches(b, a)`. The relation is
/// not transitive. Containment and prefix rules over-match short tokens
/// ("c" vs "css"); `min_partial_len` switches them off when the shorter token is
/// below that many characters. The default of 1 keeps them fully permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LooseMatchPolicy {
    pub min_partial_len: usize,
}

impl Default for LooseMatchPolicy {
    fn default() -> Self {
        Self { min_partial_len: 1 }
    }
}

impl LooseMatchPolicy {
    pub fn new(min_partial_len: usize) -> Self {
        Self {
            min_partial_len: min_partial_len.max(1),
        }
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        let a = a.replace('_', " ");
        let b = b.replace('_', " ");
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }

        let shorter = a.chars().count().min(b.chars().count());
        if shorter >= self.min_partial_len {
            if a.contains(b) || b.contains(a) {
                return true;
            }
            if a.starts_with(b) || b.starts_with(a) {
                return true;
            }
        }

        if squash(a) == squash(b) {
            return true;
        }

        match (a.split_whitespace().next(), b.split_whitespace().next()) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    }
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive_for_nonempty() {
        let p = LooseMatchPolicy::default();
        for s in ["c", "react", "machine learning", "node_js"] {
            assert!(p.matches(s, s), "{s} should match itself");
        }
    }

    #[test]
    fn test_empty_never_matches() {
        let p = LooseMatchPolicy::default();
        assert!(!p.matches("", ""));
        assert!(!p.matches("react", ""));
        assert!(!p.matches("  ", "react"));
    }

    #[test]
    fn test_symmetric() {
        let p = LooseMatchPolicy::default();
        let tokens = ["react", "reactjs", "nodejs", "node", "css", "c", "spring boot", "springboot", "java"];
        for a in tokens {
            for b in tokens {
                assert_eq!(p.matches(a, b), p.matches(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_containment_and_prefix() {
        let p = LooseMatchPolicy::default();
        assert!(p.matches("react", "reactjs"));
        assert!(p.matches("js", "nodejs"));
        assert!(!p.matches("python", "java"));
    }

    #[test]
    fn test_whitespace_insensitive_and_first_word() {
        let p = LooseMatchPolicy::new(100);
        assert!(p.matches("spring boot", "springboot"));
        assert!(p.matches("machine learning", "machine vision"));
        assert!(p.matches("node_js", "node js"));
    }

    #[test]
    fn test_short_tokens_overmatch_by_default() {
        let p = LooseMatchPolicy::default();
        assert!(p.matches("c", "css"));
    }

    #[test]
    fn test_min_partial_len_guards_short_tokens() {
        let p = LooseMatchPolicy::new(3);
        assert!(!p.matches("c", "css"));
        assert!(!p.matches("go", "google"));
        assert!(p.matches("react", "reactjs"));
    }

    #[test]
    fn test_not_transitive() {
        let p = LooseMatchPolicy::default();
        assert!(p.matches("java", "javascript"));
        assert!(p.matches("script", "javascript"));
        assert!(!p.matches("java", "script"));
    }
}
