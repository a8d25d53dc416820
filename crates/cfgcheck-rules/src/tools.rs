//! Cross-tool agreement checks
//!
//! The formatter (black) is the reference: the import sorter and linter
//! must wrap lines where black does, and every tool that targets an
//! interpreter version must target one the project allows.

use cfgcheck_meta::version::parse_python_version;
use cfgcheck_meta::{ConfigModel, ToolKind, ToolSection, VersionConstraint};

use crate::violation::{Severity, Violation, ViolationKind};

/// black's line length when none is configured.
pub const BLACK_DEFAULT_LINE_LENGTH: i64 = 88;

/// The isort profile matching black's output.
const BLACK_PROFILE: &str = "black";

/// Check that formatter, import sorter, linter, type checker and test runner
/// settings agree with each other and with the declared dependencies.
pub fn validate_tool_agreement(model: &ConfigModel) -> Vec<Violation> {
    let mut violations = Vec::new();

    let black = model.tool(&ToolKind::Black);
    let uses_black = black.is_some() || model.declares_dependency("black");
    let isort = model.tool(&ToolKind::Isort);

    if uses_black {
        let black_length = black
            .and_then(|section| section.int_value("line-length"))
            .unwrap_or(BLACK_DEFAULT_LINE_LENGTH);

        if let Some(isort) = isort {
            check_isort_profile(isort, &mut violations);
            check_isort_line_length(isort, black_length, &mut violations);
        }
        if let Some(pylint) = model.tool(&ToolKind::Pylint) {
            check_pylint_line_length(pylint, black_length, &mut violations);
        }
    }

    let interpreters = interpreter_constraints(model);
    if !interpreters.is_empty() {
        if let Some(mypy) = model.tool(&ToolKind::Mypy) {
            check_mypy_python_version(mypy, &interpreters, &mut violations);
        }
        if let Some(black) = black {
            check_black_targets(black, &interpreters, &mut violations);
        }
    }

    if let Some(pytest) = model.tool(&ToolKind::Pytest) {
        check_pytest_minversion(model, pytest, &mut violations);
    }

    tracing::debug!(uses_black, violations = violations.len(), "tool agreement checked");
    violations
}

/// Interpreter constraints that parse; broken ones are reported by the
/// dependency pass.
fn interpreter_constraints(model: &ConfigModel) -> Vec<(String, VersionConstraint)> {
    model
        .python
        .iter()
        .filter_map(|req| {
            VersionConstraint::parse(&req.constraint)
                .ok()
                .map(|c| (format!("{}.{}", req.section, req.field), c))
        })
        .collect()
}

fn field<'a>(section: &'a ToolSection, key: &'a str) -> &'a str {
    section.get(key).map(|s| s.key.as_str()).unwrap_or(key)
}

fn check_isort_profile(isort: &ToolSection, violations: &mut Vec<Violation>) {
    match isort.value("profile") {
        Some(value) => {
            // Non-string profiles are a schema problem
            let Some(profile) = value.as_str() else {
                return;
            };
            if profile != BLACK_PROFILE {
                violations.push(Violation::new(
                    ViolationKind::ProfileMismatch,
                    &isort.section,
                    "profile",
                    format!(
                        "profile \"{profile}\" does not match formatter black \
                         (expected \"{BLACK_PROFILE}\")"
                    ),
                ));
            }
        }
        None => violations.push(
            Violation::new(
                ViolationKind::ProfileMismatch,
                &isort.section,
                "profile",
                format!(
                    "no profile set while black formats the code; \
                     set profile = \"{BLACK_PROFILE}\""
                ),
            )
            .with_severity(Severity::Warning),
        ),
    }
}

fn check_isort_line_length(
    isort: &ToolSection,
    black_length: i64,
    violations: &mut Vec<Violation>,
) {
    let explicit = isort.int_value("line_length");
    let effective = explicit.or_else(|| {
        (isort.str_value("profile") == Some(BLACK_PROFILE)).then_some(BLACK_DEFAULT_LINE_LENGTH)
    });
    let Some(isort_length) = effective else {
        return;
    };

    if isort_length != black_length {
        let origin = if explicit.is_some() { "" } else { " (from profile \"black\")" };
        violations.push(Violation::new(
            ViolationKind::LineLengthMismatch,
            &isort.section,
            field(isort, "line_length"),
            format!("isort wraps at {isort_length}{origin} but black wraps at {black_length}"),
        ));
    }
}

fn check_pylint_line_length(
    pylint: &ToolSection,
    black_length: i64,
    violations: &mut Vec<Violation>,
) {
    let Some(setting) = pylint.get("format.max-line-length") else {
        return;
    };
    let Some(max) = setting.value.as_integer() else {
        return;
    };

    if max < black_length {
        let option = setting.key.rsplit_once('.').map_or(setting.key.as_str(), |(_, o)| o);
        violations.push(Violation::new(
            ViolationKind::LineLengthMismatch,
            pylint.setting_path(setting),
            option,
            format!(
                "pylint allows {max} characters but black produces lines up to {black_length}"
            ),
        ));
    }
}

fn check_mypy_python_version(
    mypy: &ToolSection,
    interpreters: &[(String, VersionConstraint)],
    violations: &mut Vec<Violation>,
) {
    let Some(written) = mypy.str_value("python_version") else {
        return;
    };
    let key = field(mypy, "python_version");

    let version = match parse_python_version(written) {
        Ok(version) => version,
        Err(e) => {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                &mypy.section,
                key,
                e.to_string(),
            ));
            return;
        }
    };

    for (location, constraint) in interpreters {
        if !constraint.admits_series(version.major, version.minor) {
            violations.push(Violation::new(
                ViolationKind::PythonVersionMismatch,
                &mypy.section,
                key,
                format!("mypy checks for Python {written} but {location} requires '{constraint}'"),
            ));
        }
    }
}

/// Parse a black target like `py38` or `py310` into (major, minor).
fn parse_black_target(target: &str) -> Option<(u64, u64)> {
    let digits = target.strip_prefix("py")?;
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (major, minor) = digits.split_at(1);
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn check_black_targets(
    black: &ToolSection,
    interpreters: &[(String, VersionConstraint)],
    violations: &mut Vec<Violation>,
) {
    let Some(setting) = black.get("target-version") else {
        return;
    };

    for target in cfgcheck_meta::model::string_list(&setting.value) {
        let Some((major, minor)) = parse_black_target(&target) else {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                &black.section,
                &setting.key,
                format!("'{target}' is not a target version like 'py38'"),
            ));
            continue;
        };

        for (location, constraint) in interpreters {
            if !constraint.admits_series(major, minor) {
                violations.push(Violation::new(
                    ViolationKind::PythonVersionMismatch,
                    &black.section,
                    &setting.key,
                    format!(
                        "black targets Python {major}.{minor} but {location} requires \
                         '{constraint}'"
                    ),
                ));
            }
        }
    }
}

fn check_pytest_minversion(
    model: &ConfigModel,
    pytest: &ToolSection,
    violations: &mut Vec<Violation>,
) {
    let Some(setting) = pytest.get("ini_options.minversion") else {
        return;
    };
    let Some(minversion) = setting.value.as_str() else {
        return;
    };
    let section = pytest.setting_path(setting);

    let minimum = match VersionConstraint::parse(&format!(">={minversion}")) {
        Ok(minimum) => minimum,
        Err(_) => {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                &section,
                "minversion",
                format!("'{minversion}' is not a version"),
            ));
            return;
        }
    };

    for dep in model.dependencies_named("pytest") {
        let Some(declared) = dep
            .constraint
            .as_deref()
            .and_then(|c| VersionConstraint::parse(c).ok())
        else {
            continue;
        };
        if !declared.intersects(&minimum) {
            violations.push(Violation::new(
                ViolationKind::ConflictingConstraints,
                &section,
                "minversion",
                format!(
                    "pytest {minversion} or newer is required but {} pins {} to '{declared}'",
                    dep.section, dep.name
                ),
            ));
        }
    }
}
