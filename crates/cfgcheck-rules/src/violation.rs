//! Violations found by the validation passes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two families of findings. Malformed input is not a violation; it is
/// reported as a load error before validation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationClass {
    /// A value does not fit the schema of its own section.
    Schema,
    /// Two or more statements contradict each other.
    Consistency,
}

/// How much a violation matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Printed, but only fails the run in strict mode.
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    InvalidVersionConstraint,
    UnsatisfiableConstraint,
    DuplicateDependency,
    ConflictingConstraints,
    ProfileMismatch,
    LineLengthMismatch,
    PythonVersionMismatch,
    InvalidModulePattern,
    DuplicatePattern,
    IgnoresFirstParty,
    UnknownKey,
    InvalidValue,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 12] = [
        ViolationKind::InvalidVersionConstraint,
        ViolationKind::UnsatisfiableConstraint,
        ViolationKind::DuplicateDependency,
        ViolationKind::ConflictingConstraints,
        ViolationKind::ProfileMismatch,
        ViolationKind::LineLengthMismatch,
        ViolationKind::PythonVersionMismatch,
        ViolationKind::InvalidModulePattern,
        ViolationKind::DuplicatePattern,
        ViolationKind::IgnoresFirstParty,
        ViolationKind::UnknownKey,
        ViolationKind::InvalidValue,
    ];

    pub fn class(&self) -> ViolationClass {
        match self {
            ViolationKind::InvalidVersionConstraint
            | ViolationKind::InvalidModulePattern
            | ViolationKind::UnknownKey
            | ViolationKind::InvalidValue => ViolationClass::Schema,
            ViolationKind::UnsatisfiableConstraint
            | ViolationKind::DuplicateDependency
            | ViolationKind::ConflictingConstraints
            | ViolationKind::ProfileMismatch
            | ViolationKind::LineLengthMismatch
            | ViolationKind::PythonVersionMismatch
            | ViolationKind::DuplicatePattern
            | ViolationKind::IgnoresFirstParty => ViolationClass::Consistency,
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            ViolationKind::UnknownKey | ViolationKind::IgnoresFirstParty => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::InvalidVersionConstraint => "invalid-version-constraint",
            ViolationKind::UnsatisfiableConstraint => "unsatisfiable-constraint",
            ViolationKind::DuplicateDependency => "duplicate-dependency",
            ViolationKind::ConflictingConstraints => "conflicting-constraints",
            ViolationKind::ProfileMismatch => "profile-mismatch",
            ViolationKind::LineLengthMismatch => "line-length-mismatch",
            ViolationKind::PythonVersionMismatch => "python-version-mismatch",
            ViolationKind::InvalidModulePattern => "invalid-module-pattern",
            ViolationKind::DuplicatePattern => "duplicate-pattern",
            ViolationKind::IgnoresFirstParty => "ignores-first-party",
            ViolationKind::UnknownKey => "unknown-key",
            ViolationKind::InvalidValue => "invalid-value",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a kind name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown violation kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ViolationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        ViolationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// One finding, pointing at the offending section and field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub class: ViolationClass,
    pub severity: Severity,
    /// Dotted section path, e.g. `tool.isort`.
    pub section: String,
    /// Key within the section, e.g. `profile`. Empty for whole-section findings.
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        section: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            class: kind.class(),
            severity: kind.default_severity(),
            section: section.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// `section.field`, or just the section when there is no field.
    pub fn location(&self) -> String {
        if self.field.is_empty() {
            self.section.clone()
        } else {
            format!("{}.{}", self.section, self.field)
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity,
            self.kind,
            SingleLine(&self.location()),
            SingleLine(&self.message)
        )
    }
}

/// Writes text with control characters escaped, so keys and values taken
/// from the document cannot break the one-line-per-violation format.
struct SingleLine<'a>(&'a str);

impl fmt::Display for SingleLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c.is_control() {
                write!(f, "{}", c.escape_default())?;
            } else {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}
