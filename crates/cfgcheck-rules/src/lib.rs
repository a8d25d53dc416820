//! Validation passes for validate-config
//!
//! Each pass is a pure function from a [`ConfigModel`](cfgcheck_meta::ConfigModel)
//! to the [`Violation`]s it finds. The [`Validator`] runs them in a fixed
//! order and [`report`] renders the result and picks the exit status.

pub mod dependencies;
pub mod ignore;
pub mod options;
pub mod report;
pub mod schema;
pub mod tools;
pub mod validator;
pub mod violation;

pub use dependencies::validate_dependency_constraints;
pub use ignore::validate_ignore_rules;
pub use options::ValidatorOptions;
pub use report::{ExitStatus, OutputFormat, ReportOptions, Summary, exit_status, report};
pub use schema::validate_tool_schemas;
pub use tools::validate_tool_agreement;
pub use validator::{Validated, Validator};
pub use violation::{Severity, Violation, ViolationClass, ViolationKind};
