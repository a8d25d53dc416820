//! Module-path matchers such as `celery.*` or `site.*.migrations`
//!
//! Two dialects are understood:
//!
//! - **Dotted** (mypy overrides): segments are Python identifiers or a lone
//!   `*`. A trailing `*` matches the prefix module and all of its
//!   submodules; an inner `*` matches one or more segments.
//! - **Glob** (pylint `ignored-modules`): fnmatch syntax applied to the
//!   whole qualified name, so `celery*` and `ws.?pp` are allowed and `*`
//!   may span dots.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ToolKind;
use crate::{Error, Result};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A glob segment: identifier characters, `*`, `?` and `[...]` classes.
static GLOB_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z0-9_*?]|\[!?[A-Za-z0-9_-]+\])+$").unwrap());

/// Which pattern grammar a tool reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSyntax {
    Dotted,
    Glob,
}

impl PatternSyntax {
    pub fn for_tool(tool: &ToolKind) -> Self {
        match tool {
            ToolKind::Pylint => PatternSyntax::Glob,
            _ => PatternSyntax::Dotted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Name(String),
    Wildcard,
}

#[derive(Debug, Clone)]
enum Matcher {
    Segments(Vec<Segment>),
    Glob(Regex),
}

/// A validated module-path matcher.
#[derive(Debug, Clone)]
pub struct ModulePattern {
    raw: String,
    syntax: PatternSyntax,
    matcher: Matcher,
}

impl PartialEq for ModulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.syntax == other.syntax
    }
}

impl Eq for ModulePattern {}

impl ModulePattern {
    /// Parse and validate a dotted (mypy style) pattern.
    pub fn parse(pattern: &str) -> Result<Self> {
        Self::parse_with(pattern, PatternSyntax::Dotted)
    }

    /// Parse and validate a pattern in the given dialect.
    pub fn parse_with(pattern: &str, syntax: PatternSyntax) -> Result<Self> {
        let invalid = |reason: &str| Error::ModulePattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("pattern contains whitespace"));
        }
        if pattern.split('.').any(str::is_empty) {
            return Err(invalid("empty path segment"));
        }

        let matcher = match syntax {
            PatternSyntax::Dotted => {
                Matcher::Segments(dotted_segments(pattern).map_err(invalid)?)
            }
            PatternSyntax::Glob => Matcher::Glob(glob_regex(pattern).map_err(invalid)?),
        };

        Ok(Self {
            raw: pattern.to_string(),
            syntax,
            matcher,
        })
    }

    /// Check whether a dotted module name is covered by this pattern.
    pub fn matches(&self, module: &str) -> bool {
        match &self.matcher {
            Matcher::Segments(segments) => {
                let parts: Vec<&str> = module.split('.').collect();
                match_segments(segments, &parts)
            }
            Matcher::Glob(regex) => regex.is_match(module),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn dotted_segments(pattern: &str) -> std::result::Result<Vec<Segment>, &'static str> {
    let mut segments = Vec::new();
    for part in pattern.split('.') {
        let segment = match part {
            "*" => Segment::Wildcard,
            name if IDENTIFIER.is_match(name) => Segment::Name(name.to_string()),
            name if name.contains('*') => return Err("'*' must stand alone as a path segment"),
            _ => return Err("segment is not a valid Python identifier"),
        };
        segments.push(segment);
    }

    if segments.iter().all(|s| *s == Segment::Wildcard) {
        return Err("pattern must name at least one module");
    }
    Ok(segments)
}

/// Translate an fnmatch pattern into an anchored regex.
fn glob_regex(pattern: &str) -> std::result::Result<Regex, &'static str> {
    if !pattern.split('.').all(|segment| GLOB_SEGMENT.is_match(segment)) {
        return Err("segment is not a valid glob over module names");
    }
    if pattern.chars().all(|c| matches!(c, '*' | '?' | '.')) {
        return Err("pattern must name at least one module");
    }

    let mut source = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '[' => {
                source.push('[');
                for inner in chars.by_ref() {
                    match inner {
                        ']' => break,
                        '!' => source.push('^'),
                        '-' => source.push('-'),
                        other => source.push(other),
                    }
                }
                source.push(']');
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|_| "pattern is not a valid glob")
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        // Trailing wildcard: the package itself and everything below it
        Some((Segment::Wildcard, [])) => true,
        Some((Segment::Wildcard, rest)) => {
            (1..=parts.len()).any(|taken| match_segments(rest, &parts[taken..]))
        }
        Some((Segment::Name(name), rest)) => {
            parts.first().is_some_and(|part| *part == name.as_str())
                && match_segments(rest, &parts[1..])
        }
    }
}

impl fmt::Display for ModulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_patterns() {
        let valid = ["celery", "celery.*", "kombu.utils", "site.*.migrations", "_private.mod_1"];
        for pattern in valid {
            assert!(ModulePattern::parse(pattern).is_ok(), "{pattern} should be valid");
        }
    }

    #[test]
    fn test_parse_invalid_patterns() {
        let invalid = [
            "", "*", "celery.", ".celery", "cel*", "celery..tasks", "9lives", "django stubs", "a-b",
        ];
        for pattern in invalid {
            assert!(ModulePattern::parse(pattern).is_err(), "{pattern:?} should be invalid");
        }
    }

    #[test]
    fn test_trailing_wildcard_matches_package_and_children() {
        let p = ModulePattern::parse("celery.*").unwrap();
        assert!(p.matches("celery"));
        assert!(p.matches("celery.app.task"));
        assert!(!p.matches("celery_utils"));
        assert!(!p.matches("kombu"));
    }

    #[test]
    fn test_inner_wildcard_needs_a_segment() {
        let p = ModulePattern::parse("ws.*.migrations").unwrap();
        assert!(p.matches("ws.app.migrations"));
        assert!(p.matches("ws.a.b.migrations"));
        assert!(!p.matches("ws.migrations"));
    }

    #[test]
    fn test_exact_pattern() {
        let p = ModulePattern::parse("ws.settings").unwrap();
        assert!(p.matches("ws.settings"));
        assert!(!p.matches("ws"));
        assert!(!p.matches("ws.settings.local"));
    }

    #[test]
    fn test_glob_patterns_parse() {
        for pattern in ["celery*", "ws.?pp", "kombu.*x", "lib[0-9]", "ws.[!t]ests", "celery"] {
            assert!(
                ModulePattern::parse_with(pattern, PatternSyntax::Glob).is_ok(),
                "{pattern} should be a valid glob"
            );
        }
        for pattern in ["", "*", "*.?", "celery..x", "a b", "ws.[", "we$rd"] {
            assert!(
                ModulePattern::parse_with(pattern, PatternSyntax::Glob).is_err(),
                "{pattern:?} should be an invalid glob"
            );
        }
    }

    #[test]
    fn test_glob_star_spans_dots() {
        let p = ModulePattern::parse_with("celery*", PatternSyntax::Glob).unwrap();
        assert!(p.matches("celery"));
        assert!(p.matches("celery_utils"));
        assert!(p.matches("celery.app.task"));
        assert!(!p.matches("kombu.celery"));

        let p = ModulePattern::parse_with("lib[!0-9]", PatternSyntax::Glob).unwrap();
        assert!(p.matches("libx"));
        assert!(!p.matches("lib3"));
    }

    #[test]
    fn test_syntax_for_tool() {
        assert_eq!(PatternSyntax::for_tool(&ToolKind::Pylint), PatternSyntax::Glob);
        assert_eq!(PatternSyntax::for_tool(&ToolKind::Mypy), PatternSyntax::Dotted);
    }
}
