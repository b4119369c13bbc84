// src/codeowners.rs

//! Ownership rules in the `CODEOWNERS` line format.
//!
//! Rules are kept in declaration order. When several patterns match a path,
//! the one declared last wins, whatever its specificity. Re-declaring an
//! identical pattern replaces its owners but keeps its original position.

use crate::error::{ChurnError, Result};
use crate::model::Owners;
use regex::Regex;
use tracing::debug;

/// Filenames checked for an ownership document, first found wins
pub const CODEOWNERS_CANDIDATES: [&str; 2] = ["CODEOWNERS", "CODEOWNERS.md"];

#[derive(Debug, Clone)]
enum Matcher {
    /// `/prefix`: raw string prefix test on the remainder
    Anchored(String),
    /// `**/suffix`: `/suffix` anywhere, or the path ends with `suffix`
    AnyDepth(String),
    /// Any other pattern containing `*`
    Wildcard(Regex),
    Exact(String),
}

impl Matcher {
    fn compile(pattern: &str) -> Result<Self> {
        if let Some(rest) = pattern.strip_prefix('/') {
            return Ok(Matcher::Anchored(rest.to_string()));
        }
        if let Some(rest) = pattern.strip_prefix("**/") {
            return Ok(Matcher::AnyDepth(rest.to_string()));
        }
        if pattern.contains('*') {
            let body = regex::escape(pattern).replace(r"\*", ".*");
            let regex = Regex::new(&format!("^{body}$")).map_err(|source| {
                ChurnError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }
            })?;
            return Ok(Matcher::Wildcard(regex));
        }
        Ok(Matcher::Exact(pattern.to_string()))
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Anchored(prefix) => path.starts_with(prefix.as_str()),
            Matcher::AnyDepth(rest) => {
                path.contains(&format!("/{rest}")) || path.ends_with(rest.as_str())
            }
            Matcher::Wildcard(regex) => regex.is_match(path),
            Matcher::Exact(exact) => path == exact,
        }
    }
}

/// A single `pattern owner...` line
#[derive(Debug, Clone)]
pub struct OwnershipRule {
    pub pattern: String,
    pub owners: Owners,
    matcher: Matcher,
}

impl OwnershipRule {
    pub fn new(pattern: impl Into<String>, owners: Owners) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = Matcher::compile(&pattern)?;
        Ok(Self {
            pattern,
            owners,
            matcher,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

/// A line that does not carry a pattern and at least one owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct OwnershipRules {
    rules: Vec<OwnershipRule>,
}

impl OwnershipRules {
    /// Parses a rules document. Malformed lines are skipped; use
    /// [`OwnershipRules::syntax_issues`] to report them.
    pub fn parse(content: &str) -> Self {
        let mut rules: Vec<OwnershipRule> = Vec::new();

        for tokens in content.lines().filter_map(tokenize) {
            if tokens.len() < 2 {
                continue;
            }
            let pattern = tokens[0].clone();
            let owners: Owners = tokens[1..].to_vec();

            if let Some(existing) = rules.iter_mut().find(|r| r.pattern == pattern) {
                existing.owners = owners;
                continue;
            }
            match OwnershipRule::new(pattern, owners) {
                Ok(rule) => rules.push(rule),
                Err(e) => debug!("skipping ownership rule: {}", e),
            }
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[OwnershipRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Owners of the last-declared rule matching `path`, or `None`.
    pub fn owners_for(&self, path: &str) -> Option<&Owners> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .map(|rule| &rule.owners)
    }

    pub fn is_valid_syntax(content: &str) -> bool {
        Self::syntax_issues(content).is_empty()
    }

    pub fn syntax_issues(content: &str) -> Vec<SyntaxIssue> {
        content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let tokens = tokenize(line)?;
                (tokens.len() < 2).then(|| SyntaxIssue {
                    line_number: idx + 1,
                    text: line.trim().to_string(),
                })
            })
            .collect()
    }
}

/// Splits a line into whitespace-separated tokens after dropping the inline
/// comment. Returns `None` for blank and comment-only lines.
fn tokenize(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let body = strip_comment(line);
    Some(
        body.split_whitespace()
            .map(|token| token.replace(r"\#", "#"))
            .collect(),
    )
}

fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '\\' => escaped = !escaped,
            '#' if !escaped => return &line[..idx],
            _ => escaped = false,
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(rules: &OwnershipRules, path: &str) -> Option<Vec<String>> {
        rules.owners_for(path).cloned()
    }

    #[test]
    fn later_declaration_wins_regardless_of_specificity() {
        let rules = OwnershipRules::parse("*.py @A\n/src/*.py @B\n");
        assert_eq!(owners(&rules, "src/main.py"), Some(vec!["@B".to_string()]));

        let rules = OwnershipRules::parse("/src/*.py @B\n*.py @A\n");
        assert_eq!(owners(&rules, "src/main.py"), Some(vec!["@A".to_string()]));
    }

    #[test]
    fn leading_slash_is_a_raw_prefix() {
        let rules = OwnershipRules::parse("/docs @writers");
        assert!(rules.owners_for("docs/readme.md").is_some());
        assert!(rules.owners_for("docsite/index.html").is_some());
        assert!(rules.owners_for("src/docs/readme.md").is_none());
    }

    #[test]
    fn bare_pattern_requires_equality() {
        let rules = OwnershipRules::parse("docs @writers");
        assert!(rules.owners_for("docs/readme.md").is_none());
        assert!(rules.owners_for("docs").is_some());
    }

    #[test]
    fn double_star_matches_any_depth() {
        let rules = OwnershipRules::parse("**/build.rs @tooling");
        assert!(rules.owners_for("crates/core/build.rs").is_some());
        assert!(rules.owners_for("build.rs").is_some());
        assert!(rules.owners_for("build.rs.bak").is_none());
    }

    #[test]
    fn wildcard_must_match_the_whole_path() {
        let rules = OwnershipRules::parse("src/*.rs @rust");
        assert!(rules.owners_for("src/lib.rs").is_some());
        assert!(rules.owners_for("src/nested/mod.rs").is_some());
        assert!(rules.owners_for("src/lib.rs.orig").is_none());
        assert!(rules.owners_for("other/src/lib.rs").is_none());
    }

    #[test]
    fn wildcard_escapes_regex_metacharacters() {
        let rules = OwnershipRules::parse("*.min.js @web");
        assert!(rules.owners_for("app.min.js").is_some());
        assert!(rules.owners_for("app-minxjs").is_none());
    }

    #[test]
    fn multiple_owners_keep_their_order() {
        let rules = OwnershipRules::parse("*.go   @alice  @bob\t@carol");
        assert_eq!(
            owners(&rules, "main.go"),
            Some(vec!["@alice".into(), "@bob".into(), "@carol".into()])
        );
    }

    #[test]
    fn comments_and_invalid_lines_are_skipped() {
        let content = "# header\n\n*.md @docs # trailing\nlonely\n/src @core\n";
        let rules = OwnershipRules::parse(content);
        assert_eq!(rules.rules().len(), 2);
        assert_eq!(owners(&rules, "a.md"), Some(vec!["@docs".into()]));
        assert_eq!(owners(&rules, "src/x.rs"), Some(vec!["@core".into()]));
    }

    #[test]
    fn escaped_hash_is_literal() {
        let rules = OwnershipRules::parse(r"/notes\#1 @team # comment");
        assert_eq!(rules.rules()[0].pattern, "/notes#1");
        assert_eq!(rules.rules()[0].owners, vec!["@team".to_string()]);
    }

    #[test]
    fn redeclared_pattern_keeps_first_position() {
        let rules = OwnershipRules::parse("*.py @old\n/src @core\n*.py @new\n");
        assert_eq!(rules.rules().len(), 2);
        // `/src` is declared after the first `*.py`, so it still wins.
        assert_eq!(owners(&rules, "src/a.py"), Some(vec!["@core".into()]));
        assert_eq!(owners(&rules, "lib/a.py"), Some(vec!["@new".into()]));
    }

    #[test]
    fn empty_document_matches_nothing() {
        let rules = OwnershipRules::parse("");
        assert!(rules.is_empty());
        assert!(rules.owners_for("anything").is_none());
    }

    #[test]
    fn validation_reports_each_bad_line() {
        let content = "*.rs @rust\nbroken\n# fine\n   \nalso-broken # note\n";
        assert!(!OwnershipRules::is_valid_syntax(content));
        let issues = OwnershipRules::syntax_issues(content);
        assert_eq!(
            issues,
            vec![
                SyntaxIssue { line_number: 2, text: "broken".into() },
                SyntaxIssue { line_number: 5, text: "also-broken # note".into() },
            ]
        );
        assert!(OwnershipRules::is_valid_syntax("*.rs @rust\n# only comments\n"));
    }
}
