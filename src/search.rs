//! Fuzzy matching for the picker filters.
//!
//! Wraps the skim matcher so the rest of the code never touches the
//! underlying implementation directly.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

pub struct Matcher {
    inner: SkimMatcherV2,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            inner: SkimMatcherV2::default(),
        }
    }

    /// Case-insensitive fuzzy match of `pattern` against `text`.
    pub fn matches(&self, text: &str, pattern: &str) -> bool {
        self.score(text, pattern).is_some()
    }

    /// Match score for ranking; `None` when there is no match.
    pub fn score(&self, text: &str, pattern: &str) -> Option<i64> {
        self.inner.fuzzy_match(text, &pattern.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_matches_subsequences() {
        let matcher = Matcher::new();
        assert!(matcher.matches("cl1_hadoop", "clhd"));
        assert!(matcher.matches("dev_hive", "dhv"));
        assert!(!matcher.matches("dev_hive", "xyz"));
    }

    #[test]
    fn matching_ignores_case() {
        let matcher = Matcher::new();
        assert!(matcher.matches("HDFS", "hdfs"));
        assert!(matcher.matches("hdfs", "HDFS"));
    }

    #[test]
    fn exact_match_scores_at_least_as_high() {
        let matcher = Matcher::new();
        let exact = matcher.score("hive", "hive").unwrap();
        let fuzzy = matcher.score("hive_dev", "hive").unwrap();
        assert!(exact >= fuzzy);
    }
}
