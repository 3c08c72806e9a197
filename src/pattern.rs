/*!
 * Wildcard pattern matching for include and exclude rules
 *
 * A pattern is either a literal, which must equal the whole candidate, or
 * contains `*` wildcards, each standing for zero or more arbitrary characters
 * (slashes included). Every pattern is anchored at both ends. Patterns are
 * compiled once into a single `RegexSet` and OR-combined.
 */

use regex::{RegexSet, RegexSetBuilder};

use crate::error::Result;

/// A compiled, OR-combined set of wildcard patterns
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: RegexSet,
}

impl PatternSet {
    /// Compile case-sensitive patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Self::with_case(patterns, true)
    }

    /// Compile patterns with an explicit case policy
    pub fn with_case<S: AsRef<str>>(patterns: &[S], case_sensitive: bool) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let set = RegexSetBuilder::new(patterns.iter().map(|p| to_regex(p)))
            .case_insensitive(!case_sensitive)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self { patterns, set })
    }

    /// A set that never matches
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    /// True when any pattern matches the whole candidate
    pub fn matches(&self, candidate: &str) -> bool {
        self.set.is_match(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The source patterns, in the order given
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Translate one wildcard pattern into an anchored regular expression
fn to_regex(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{}$", body)
}

/// One-shot convenience for callers that do not keep a compiled set
pub fn matches_any<S: AsRef<str>>(candidate: &str, patterns: &[S]) -> Result<bool> {
    Ok(PatternSet::new(patterns)?.matches(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_patterns() {
        let set = PatternSet::new(&["node_modules", "*.log", ".DS_Store"]).unwrap();

        assert!(set.matches("node_modules"));
        assert!(set.matches("error.log"));
        assert!(set.matches(".DS_Store"));
        assert!(!set.matches("src/main.ts"));
    }

    #[test]
    fn test_anchored_matching() {
        let set = PatternSet::new(&["*.ts"]).unwrap();
        assert!(set.matches("a.ts"));
        assert!(set.matches("src/deep/a.ts"));
        assert!(!set.matches("a.tsx"));

        let literal = PatternSet::new(&["build"]).unwrap();
        assert!(!literal.matches("build2"));
        assert!(!literal.matches("my-build"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let set = PatternSet::new(&["file.(1)+.txt"]).unwrap();
        assert!(set.matches("file.(1)+.txt"));
        assert!(!set.matches("fileX(1)+.txt"));

        let dots = PatternSet::new(&["*.min.js"]).unwrap();
        assert!(dots.matches("app.min.js"));
        assert!(!dots.matches("app_minxjs"));
    }

    #[test]
    fn test_star_only_matches_everything() {
        let set = PatternSet::new(&["*"]).unwrap();
        assert!(set.matches(""));
        assert!(set.matches("anything/at/all.rs"));
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = PatternSet::empty();
        assert!(set.is_empty());
        assert!(!set.matches(""));
        assert!(!set.matches("a"));

        let built = PatternSet::new::<&str>(&[]).unwrap();
        assert!(!built.matches("a"));
    }

    #[test]
    fn test_case_policy() {
        let sensitive = PatternSet::new(&["*.MD"]).unwrap();
        assert!(!sensitive.matches("readme.md"));

        let insensitive = PatternSet::with_case(&["*.MD"], false).unwrap();
        assert!(insensitive.matches("readme.md"));
    }

    #[test]
    fn test_infix_wildcards() {
        let set = PatternSet::new(&["vite.config.ts.timestamp-*", ".env.*"]).unwrap();
        assert!(set.matches("vite.config.ts.timestamp-12345.mjs"));
        assert!(set.matches(".env.local"));
        assert!(!set.matches(".env"));
        assert!(matches_any("x.a.b", &["x*b"]).unwrap());
    }
}
