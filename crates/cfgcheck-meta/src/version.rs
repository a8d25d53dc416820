//! Version constraint parsing and range algebra.
//!
//! Supports the constraint dialects found in Python project manifests:
//!
//! - **PEP 440** specifiers (e.g., `>=3.8`, `>=2.2,<3.0`, `~=1.4.5`, `==2.2.*`)
//! - **Poetry** shorthands (e.g., `^2.2`, `~1.4`, `*`, bare `1.2.3`), and
//!   `||` alternatives
//!
//! Python versions are mapped to semver by treating the release as
//! `major.minor.patch` (missing components default to 0). Pre-releases
//! (`a`, `b`, `rc`) become semver pre-release identifiers; post and dev
//! suffixes as well as local labels are ignored.
//!
//! Every constraint is lowered to a union of half-open intervals, which is
//! what conflict detection works on.
//!
//! # Examples
//!
//! ```
//! use cfgcheck_meta::version::VersionConstraint;
//!
//! let constraint = VersionConstraint::parse("^3.8").unwrap();
//! assert!(constraint.satisfies("3.8.0"));
//! assert!(constraint.satisfies("3.12.1"));
//! assert!(!constraint.satisfies("4.0"));
//!
//! // Disjoint ranges never intersect
//! let main = VersionConstraint::parse("^2.2").unwrap();
//! let dev = VersionConstraint::parse(">=3.0,<3.2").unwrap();
//! assert!(!main.intersects(&dev));
//! ```

use std::cmp::Ordering;
use std::ops::Bound;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};

use crate::error::{Error, Result};

static PEP440_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:-[0-9]+|[-_.]?(?:post|rev|r)[-_.]?[0-9]*)?
        (?:[-_.]?dev[-_.]?[0-9]*)?
        (?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?
        $",
    )
    .unwrap()
});

/// A single version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    /// `>=`
    Gte,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `<`
    Lt,
    /// `==` (also bare versions)
    Eq,
    /// `!=`
    Ne,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `~=`
    Compatible,
}

/// A version as written, with the number of release components given.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WrittenVersion {
    version: Version,
    precision: usize,
}

/// A single version specifier: an operator paired with a version.
#[derive(Debug, Clone)]
struct Specifier {
    op: CompareOp,
    written: WrittenVersion,
    wildcard: bool,
}

/// A contiguous range of versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    lower: Bound<Version>,
    upper: Bound<Version>,
}

impl Interval {
    fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn at_least(version: Version) -> Self {
        Self {
            lower: Bound::Included(version),
            upper: Bound::Unbounded,
        }
    }

    fn between(lower: Version, upper: Version) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Excluded(upper),
        }
    }

    /// Check whether the interval contains no version at all.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (
                Bound::Included(lo) | Bound::Excluded(lo),
                Bound::Included(hi) | Bound::Excluded(hi),
            ) => lo >= hi,
        }
    }

    /// Check whether `version` lies inside the interval.
    pub fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lo) => version >= lo,
            Bound::Excluded(lo) => version > lo,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(hi) => version <= hi,
            Bound::Excluded(hi) => version < hi,
        };
        above && below
    }

    /// Intersect two intervals, returning `None` when they are disjoint.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let joined = Interval {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        };
        (!joined.is_empty()).then_some(joined)
    }
}

fn tighter_lower(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            match x.cmp(y) {
                Ordering::Greater => a.clone(),
                Ordering::Less => b.clone(),
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a.clone(),
                Ordering::Equal => b.clone(),
            }
        }
    }
}

fn tighter_upper(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            match x.cmp(y) {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a.clone(),
                Ordering::Equal => b.clone(),
            }
        }
    }
}

/// Intersect two unions of intervals.
fn intersect_unions(left: &[Interval], right: &[Interval]) -> Vec<Interval> {
    left.iter()
        .flat_map(|a| right.iter().filter_map(move |b| a.intersect(b)))
        .collect()
}

impl Specifier {
    fn ranges(&self) -> std::result::Result<Vec<Interval>, String> {
        let v = self.written.version.clone();
        let precision = self.written.precision;

        let ranges = match (self.op, self.wildcard) {
            (CompareOp::Eq, true) => vec![Interval::between(v.clone(), bump(&v, precision - 1)?)],
            (CompareOp::Ne, true) => vec![
                Interval {
                    lower: Bound::Unbounded,
                    upper: Bound::Excluded(v.clone()),
                },
                Interval::at_least(bump(&v, precision - 1)?),
            ],
            (CompareOp::Gte, _) => vec![Interval::at_least(v)],
            (CompareOp::Gt, _) => vec![Interval {
                lower: Bound::Excluded(v),
                upper: Bound::Unbounded,
            }],
            (CompareOp::Lte, _) => vec![Interval {
                lower: Bound::Unbounded,
                upper: Bound::Included(v),
            }],
            (CompareOp::Lt, _) => vec![Interval {
                lower: Bound::Unbounded,
                upper: Bound::Excluded(v),
            }],
            (CompareOp::Eq, false) => vec![Interval {
                lower: Bound::Included(v.clone()),
                upper: Bound::Included(v),
            }],
            (CompareOp::Ne, false) => vec![
                Interval {
                    lower: Bound::Unbounded,
                    upper: Bound::Excluded(v.clone()),
                },
                Interval {
                    lower: Bound::Excluded(v),
                    upper: Bound::Unbounded,
                },
            ],
            (CompareOp::Caret, _) => {
                let upper = caret_upper(&self.written)?;
                vec![Interval::between(v, upper)]
            }
            (CompareOp::Tilde, _) => {
                let index = if precision == 1 { 0 } else { 1 };
                let upper = bump(&v, index)?;
                vec![Interval::between(v, upper)]
            }
            (CompareOp::Compatible, _) => {
                let upper = bump(&v, precision - 2)?;
                vec![Interval::between(v, upper)]
            }
        };
        Ok(ranges)
    }
}

/// Upper bound of a caret range: bump the left-most non-zero component
/// among those written, or the last written one if all are zero.
fn caret_upper(written: &WrittenVersion) -> std::result::Result<Version, String> {
    let v = &written.version;
    let components = [v.major, v.minor, v.patch];
    let index = components[..written.precision]
        .iter()
        .position(|c| *c != 0)
        .unwrap_or(written.precision - 1);
    bump(v, index)
}

/// Increment the release component at `index` and zero everything after it.
fn bump(v: &Version, index: usize) -> std::result::Result<Version, String> {
    let bumped = match index {
        0 => v.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
        1 => v.minor.checked_add(1).map(|minor| Version::new(v.major, minor, 0)),
        _ => v.patch.checked_add(1).map(|patch| Version::new(v.major, v.minor, patch)),
    };
    bumped.ok_or_else(|| format!("version component too large: {v}"))
}

/// A parsed version constraint that can be checked against concrete versions
/// and other constraints.
///
/// Comma or whitespace separated specifiers must all match; `||`
/// separated alternatives are unioned.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    ranges: Vec<Interval>,
    /// The original constraint string for display.
    raw: String,
}

impl PartialEq for VersionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl VersionConstraint {
    /// Parse a version constraint string.
    ///
    /// Supports PEP 440-style and Poetry-style syntax:
    /// - `>=3.8`
    /// - `>=2.2,<3.0`
    /// - `==2.2.*`, `2.2.*`
    /// - `~=1.4.5`
    /// - `^2.2`, `~2.2`
    /// - `*`
    /// - `^1.0 || ^2.0`
    pub fn parse(constraint: &str) -> Result<Self> {
        let raw = constraint.to_string();
        let fail = |reason: String| Error::VersionConstraintParse {
            constraint: raw.clone(),
            reason,
        };

        if constraint.trim().is_empty() {
            return Err(fail("empty constraint".to_string()));
        }

        let mut ranges = Vec::new();
        let mut alternatives = 0;
        for alternative in constraint.split('|') {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                // `||` leaves an empty piece between the two bars
                continue;
            }
            alternatives += 1;

            let mut current = vec![Interval::full()];
            for part in alternative.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    return Err(fail("empty specifier between commas".to_string()));
                }
                for specifier in parse_specifiers(part).map_err(&fail)? {
                    current = intersect_unions(&current, &specifier);
                }
            }
            ranges.extend(current);
        }

        if alternatives == 0 {
            return Err(fail("no alternatives".to_string()));
        }

        Ok(Self { ranges, raw })
    }

    /// Check if a version string satisfies this constraint.
    ///
    /// Returns `false` if the version string cannot be parsed.
    pub fn satisfies(&self, version: &str) -> bool {
        match parse_version(version) {
            Ok(written) => self.satisfies_version(&written.version),
            Err(_) => false,
        }
    }

    /// Check if a `semver::Version` satisfies this constraint.
    pub fn satisfies_version(&self, version: &semver::Version) -> bool {
        self.ranges.iter().any(|range| range.contains(version))
    }

    /// Check whether at least one version satisfies both constraints.
    pub fn intersects(&self, other: &VersionConstraint) -> bool {
        !intersect_unions(&self.ranges, &other.ranges).is_empty()
    }

    /// Check whether any version at all satisfies this constraint.
    pub fn is_satisfiable(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Check whether any release of the `major.minor` series is allowed.
    pub fn admits_series(&self, major: u64, minor: u64) -> bool {
        let start = Version::new(major, minor, 0);
        let series = match minor.checked_add(1) {
            Some(next) => Interval::between(start, Version::new(major, next, 0)),
            None => Interval::at_least(start),
        };
        self.ranges.iter().any(|range| range.intersect(&series).is_some())
    }

    /// Return the original constraint string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse one comma-free chunk, which may hold several whitespace separated
/// specifiers such as `>= 1.2 < 1.5`.
fn parse_specifiers(chunk: &str) -> std::result::Result<Vec<Vec<Interval>>, String> {
    let mut rest = chunk.trim();
    let mut out = Vec::new();

    while !rest.is_empty() {
        let (op, after_op) = split_operator(rest);
        let after_op = after_op.trim_start();
        let end = after_op.find(char::is_whitespace).unwrap_or(after_op.len());
        let version_str = &after_op[..end];
        rest = after_op[end..].trim_start();

        if version_str.is_empty() {
            return Err(format!("operator without version in '{chunk}'"));
        }
        out.push(parse_specifier(op, version_str)?);
    }

    Ok(out)
}

fn split_operator(s: &str) -> (Option<CompareOp>, &str) {
    const OPERATORS: [(&str, CompareOp); 10] = [
        ("===", CompareOp::Eq),
        ("~=", CompareOp::Compatible),
        (">=", CompareOp::Gte),
        ("<=", CompareOp::Lte),
        ("!=", CompareOp::Ne),
        ("==", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        ("^", CompareOp::Caret),
        ("~", CompareOp::Tilde),
    ];

    for (token, op) in OPERATORS {
        if let Some(rest) = s.strip_prefix(token) {
            return (Some(op), rest);
        }
    }
    (None, s)
}

/// Build the ranges of a single specifier like `>=3.8` or `2.2.*`.
fn parse_specifier(
    op: Option<CompareOp>,
    version_str: &str,
) -> std::result::Result<Vec<Interval>, String> {
    if version_str == "*" {
        return match op {
            None | Some(CompareOp::Eq) => Ok(vec![Interval::full()]),
            Some(_) => Err("'*' cannot be combined with an operator".to_string()),
        };
    }

    let (version_str, wildcard) = match version_str.strip_suffix(".*") {
        Some(prefix) => (prefix, true),
        None => (version_str, false),
    };

    // Bare versions are exact matches, `1.2.*` included
    let op = op.unwrap_or(CompareOp::Eq);
    if wildcard && !matches!(op, CompareOp::Eq | CompareOp::Ne) {
        return Err(format!("wildcard only allowed with == or !=: {version_str}.*"));
    }

    let written = parse_version(version_str)?;
    if wildcard && written.version.pre != Prerelease::EMPTY {
        return Err(format!("wildcard cannot follow a pre-release: {version_str}.*"));
    }
    if op == CompareOp::Compatible && written.precision < 2 {
        return Err(format!("~= requires at least two release components: {version_str}"));
    }

    Specifier { op, written, wildcard }.ranges()
}

/// Parse a PEP 440 version into semver, remembering how many release
/// components were written.
///
/// - `"3.8"` -> `3.8.0` (precision 2)
/// - `"20.8b1"` -> `20.8.0-b.1` (precision 2)
/// - `"1.2.3.4"` -> `1.2.3` (precision 3)
fn parse_version(s: &str) -> std::result::Result<WrittenVersion, String> {
    let s = s.trim();
    let caps = PEP440_VERSION
        .captures(s)
        .ok_or_else(|| format!("invalid version: {s}"))?;

    if caps.name("epoch").is_some_and(|epoch| epoch.as_str().trim_start_matches('0') != "") {
        return Err(format!("version epochs are not supported: {s}"));
    }

    let release: Vec<u64> = caps["release"]
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|e| format!("invalid version '{s}': {e}")))
        .collect::<std::result::Result<_, _>>()?;
    let precision = release.len().min(3);
    let component = |i: usize| release.get(i).copied().unwrap_or(0);
    let mut version = Version::new(component(0), component(1), component(2));

    if let Some(label) = caps.name("pre_l") {
        let label = match label.as_str().to_lowercase().as_str() {
            "alpha" | "a" => "a",
            "beta" | "b" => "b",
            _ => "rc",
        };
        let number = caps.name("pre_n").map_or("0", |n| n.as_str());
        let number = number.parse::<u64>().map_err(|e| format!("invalid version '{s}': {e}"))?;
        version.pre = Prerelease::new(&format!("{label}.{number}"))
            .map_err(|e| format!("invalid version '{s}': {e}"))?;
    }

    Ok(WrittenVersion { version, precision })
}

/// Parse a Python version string into a semver version.
pub fn parse_python_version(s: &str) -> Result<Version> {
    parse_version(s)
        .map(|written| written.version)
        .map_err(|reason| Error::VersionConstraintParse {
            constraint: s.to_string(),
            reason,
        })
}
