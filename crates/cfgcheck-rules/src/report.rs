//! Rendering violations and deciding the exit status

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::validator::count_failing;
use crate::violation::{Severity, Violation};

/// How violations are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `severity[kind] section.field: message` line per violation.
    #[default]
    Text,
    /// A single JSON document with the violations and a summary.
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// Warnings count toward the exit status.
    pub strict: bool,
}

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Violations,
    /// The run could not finish: the document could not be read or
    /// parsed, or the report could not be written.
    ParseFailure,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Violations => 1,
            ExitStatus::ParseFailure => 2,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Counts printed alongside the violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    /// Violations that affect the exit status.
    pub failing: usize,
    pub strict: bool,
}

impl Summary {
    pub fn new(violations: &[Violation], strict: bool) -> Self {
        let errors = violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count();
        Self {
            errors,
            warnings: violations.len() - errors,
            failing: count_failing(violations, strict),
            strict,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        write!(
            f,
            "{} error{}, {} warning{}",
            self.errors,
            plural(self.errors),
            self.warnings,
            plural(self.warnings)
        )?;
        if self.strict && self.warnings > 0 {
            write!(f, " (strict: warnings fail)")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    violations: &'a [Violation],
    summary: Summary,
}

/// Exit status for a set of violations.
pub fn exit_status(violations: &[Violation], strict: bool) -> ExitStatus {
    if count_failing(violations, strict) == 0 {
        ExitStatus::Success
    } else {
        ExitStatus::Violations
    }
}

/// Write every violation to `out` and compute the exit status.
pub fn report<W: Write>(
    violations: &[Violation],
    options: &ReportOptions,
    out: &mut W,
) -> io::Result<ExitStatus> {
    match options.format {
        OutputFormat::Text => {
            for violation in violations {
                writeln!(out, "{violation}")?;
            }
        }
        OutputFormat::Json => {
            let document = JsonReport {
                violations,
                summary: Summary::new(violations, options.strict),
            };
            serde_json::to_writer_pretty(&mut *out, &document)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(exit_status(violations, options.strict))
}
