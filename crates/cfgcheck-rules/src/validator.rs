//! The validation run
//!
//! A [`Validator`] is created for a loaded model and consumed by
//! [`Validator::validate`], which runs every pass once and returns the
//! terminal [`Validated`] state. There is nothing to retry and no partial
//! result: every pass always runs and all violations are collected.

use cfgcheck_meta::ConfigModel;

use crate::dependencies::validate_dependency_constraints;
use crate::ignore::validate_ignore_rules;
use crate::options::ValidatorOptions;
use crate::schema::validate_tool_schemas;
use crate::tools::validate_tool_agreement;
use crate::violation::{Severity, Violation};

type Pass = fn(&ConfigModel) -> Vec<Violation>;

/// Passes in the order their findings are reported.
const PASSES: [(&str, Pass); 4] = [
    ("schema", validate_tool_schemas),
    ("dependencies", validate_dependency_constraints),
    ("tools", validate_tool_agreement),
    ("ignore", validate_ignore_rules),
];

/// An unvalidated model together with the options for the run.
#[derive(Debug)]
pub struct Validator<'a> {
    model: &'a ConfigModel,
    options: ValidatorOptions,
}

impl<'a> Validator<'a> {
    pub fn new(model: &'a ConfigModel, options: ValidatorOptions) -> Self {
        Self { model, options }
    }

    /// Run every pass and drop violations of disabled kinds.
    pub fn validate(self) -> Validated {
        let mut violations = Vec::new();
        for (name, pass) in PASSES {
            let found = pass(self.model);
            tracing::debug!(pass = name, found = found.len(), "pass finished");
            violations.extend(found.into_iter().filter(|v| self.options.is_enabled(v.kind)));
        }

        tracing::debug!(
            origin = %self.model.origin,
            violations = violations.len(),
            strict = self.options.strict,
            "validation finished"
        );

        Validated {
            violations,
            strict: self.options.strict,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    violations: Vec<Violation>,
    strict: bool,
}

impl Validated {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Violations that fail the run: errors, plus warnings when strict.
    pub fn failing(&self) -> usize {
        count_failing(&self.violations, self.strict)
    }

    pub fn is_clean(&self) -> bool {
        self.failing() == 0
    }
}

pub(crate) fn count_failing(violations: &[Violation], strict: bool) -> usize {
    violations
        .iter()
        .filter(|v| strict || v.severity == Severity::Error)
        .count()
}
