//! PEP 508 requirement strings and package name normalization

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        (?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*
        (?:\[(?P<extras>[^\]]*)\])?\s*
        (?P<spec>[^;]*?)\s*
        (?:;(?P<marker>.*))?
        $",
    )
    .unwrap()
});

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// A requirement such as `celery[redis]>=4.4,<5 ; python_version >= "3.8"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: BTreeSet<String>,
    /// `None` for direct references (`name @ url`) and unconstrained names.
    pub constraint: Option<String>,
}

impl Requirement {
    /// Parse a PEP 508 requirement. Returns `None` when no package name can
    /// be found at all.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = REQUIREMENT.captures(text)?;
        let name = caps["name"].to_string();
        let extras = caps
            .name("extras")
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let spec = caps.name("spec").map_or("", |m| m.as_str()).trim();
        let constraint = if spec.is_empty() || spec.starts_with('@') {
            None
        } else {
            let spec = spec
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(spec)
                .trim();
            Some(spec.to_string())
        };

        Some(Self {
            name,
            extras,
            constraint,
        })
    }
}

/// Normalize a distribution name as described in PEP 503.
///
/// `Django`, `django` and `DJANGO` are the same project, as are
/// `factory_boy`, `factory-boy` and `Factory.Boy`.
pub fn normalize_name(name: &str) -> String {
    SEPARATORS.replace_all(&name.to_lowercase(), "-").into_owned()
}
