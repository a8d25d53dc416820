//! Dependency constraint checks

use std::collections::BTreeMap;

use cfgcheck_meta::{ConfigModel, DependencySpec, VersionConstraint};

use crate::violation::{Violation, ViolationKind};

/// Check every dependency and interpreter constraint.
///
/// Reports constraints that do not parse or admit no version, names
/// declared twice within one table, and same-name declarations (across
/// tables too) whose ranges have no version in common.
pub fn validate_dependency_constraints(model: &ConfigModel) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_python(model, &mut violations);

    let mut by_name: BTreeMap<String, Vec<(&DependencySpec, VersionConstraint)>> =
        BTreeMap::new();
    for dep in &model.dependencies {
        let Some(raw) = dep.constraint.as_deref() else {
            continue;
        };
        match VersionConstraint::parse(raw) {
            Ok(constraint) if !constraint.is_satisfiable() => {
                violations.push(Violation::new(
                    ViolationKind::UnsatisfiableConstraint,
                    &dep.section,
                    &dep.name,
                    format!("constraint '{raw}' admits no version"),
                ));
            }
            Ok(constraint) => {
                by_name
                    .entry(dep.normalized_name())
                    .or_default()
                    .push((dep, constraint));
            }
            Err(e) => {
                violations.push(Violation::new(
                    ViolationKind::InvalidVersionConstraint,
                    &dep.section,
                    &dep.name,
                    e.to_string(),
                ));
            }
        }
    }

    check_duplicates(model, &mut violations);

    for entries in by_name.values() {
        for (i, (first, first_constraint)) in entries.iter().enumerate() {
            for (second, second_constraint) in &entries[i + 1..] {
                if first_constraint.intersects(second_constraint) {
                    continue;
                }
                violations.push(Violation::new(
                    ViolationKind::ConflictingConstraints,
                    &second.section,
                    &second.name,
                    format!(
                        "'{}' conflicts with '{}' declared for {} in {}",
                        second_constraint, first_constraint, first.name, first.section
                    ),
                ));
            }
        }
    }

    tracing::debug!(violations = violations.len(), "dependency constraints checked");
    violations
}

fn check_python(model: &ConfigModel, violations: &mut Vec<Violation>) {
    let mut parsed = Vec::new();
    for requirement in &model.python {
        match VersionConstraint::parse(&requirement.constraint) {
            Ok(constraint) if !constraint.is_satisfiable() => {
                violations.push(Violation::new(
                    ViolationKind::UnsatisfiableConstraint,
                    &requirement.section,
                    &requirement.field,
                    format!("interpreter constraint '{constraint}' admits no version"),
                ));
            }
            Ok(constraint) => parsed.push((requirement, constraint)),
            Err(e) => {
                violations.push(Violation::new(
                    ViolationKind::InvalidVersionConstraint,
                    &requirement.section,
                    &requirement.field,
                    e.to_string(),
                ));
            }
        }
    }

    // [project] and [tool.poetry] may both declare the interpreter
    for (i, (first, first_constraint)) in parsed.iter().enumerate() {
        for (second, second_constraint) in &parsed[i + 1..] {
            if !first_constraint.intersects(second_constraint) {
                violations.push(Violation::new(
                    ViolationKind::ConflictingConstraints,
                    &second.section,
                    &second.field,
                    format!(
                        "interpreter constraint '{}' conflicts with '{}' in {}",
                        second_constraint, first_constraint, first.section
                    ),
                ));
            }
        }
    }
}

/// One violation per name declared more than once in the same table.
///
/// Extras such as `test` and `all` often repeat a requirement on purpose,
/// so separate tables of one group do not count as duplicates.
fn check_duplicates(model: &ConfigModel, violations: &mut Vec<Violation>) {
    let mut seen: BTreeMap<(&str, String), Vec<&DependencySpec>> = BTreeMap::new();
    for dep in &model.dependencies {
        seen.entry((dep.section.as_str(), dep.normalized_name()))
            .or_default()
            .push(dep);
    }

    for ((section, name), entries) in seen {
        if entries.len() < 2 {
            continue;
        }
        let last = entries[entries.len() - 1];
        let spellings: Vec<&str> = entries.iter().map(|d| d.name.as_str()).collect();
        violations.push(Violation::new(
            ViolationKind::DuplicateDependency,
            section,
            &last.name,
            format!(
                "'{name}' is declared {} times in {section} ({})",
                entries.len(),
                spellings.join(", ")
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgcheck_meta::{ConfigSource, load_configuration};

    fn check(text: &str) -> Vec<Violation> {
        let model = load_configuration(&ConfigSource::inline(text)).unwrap();
        validate_dependency_constraints(&model)
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_compatible_constraints_pass() {
        let violations = check(
            r#"
[tool.poetry.dependencies]
python = "^3.8"
requests = "^2.24"

[tool.poetry.dev-dependencies]
Requests = ">=2.20"
"#,
        );
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_main_and_dev_ranges_conflict() {
        let violations = check(
            r#"
[tool.poetry.dependencies]
Django = "^2.2"

[tool.poetry.dev-dependencies]
django = ">=3.0,<3.2"
"#,
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::ConflictingConstraints]);
        assert_eq!(violations[0].section, "tool.poetry.dev-dependencies");
        assert_eq!(violations[0].field, "django");
    }

    #[test]
    fn test_invalid_constraint_syntax() {
        let violations = check("[tool.poetry.dependencies]\nrequests = \">>2\"\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::InvalidVersionConstraint]);
    }

    #[test]
    fn test_unsatisfiable_constraint() {
        let violations = check("[tool.poetry.dependencies]\nrequests = \">=3.0,<2.0\"\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::UnsatisfiableConstraint]);
    }

    #[test]
    fn test_duplicate_within_group_uses_normalized_names() {
        let violations = check(
            "[project]\ndependencies = [\"factory_boy>=3.0\", \"Factory-Boy>=3.1\"]\n",
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::DuplicateDependency]);
        assert_eq!(violations[0].section, "project.dependencies");
        assert!(violations[0].message.contains("2 times"));
    }

    #[test]
    fn test_same_requirement_in_two_extras_is_not_a_duplicate() {
        let violations = check(
            r#"
[project.optional-dependencies]
test = ["pytest>=6"]
all = ["pytest>=6", "black"]
"#,
        );
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_conflicts_still_span_extras() {
        let violations = check(
            r#"
[project.optional-dependencies]
test = ["pytest>=7"]
legacy = ["pytest<6"]
"#,
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::ConflictingConstraints]);
    }

    #[test]
    fn test_oversized_version_component_is_invalid() {
        let violations = check("[tool.poetry.dependencies]\nfoo = \"^18446744073709551615\"\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::InvalidVersionConstraint]);
        assert_eq!(violations[0].field, "foo");
    }

    #[test]
    fn test_conflicting_interpreter_declarations() {
        let violations = check(
            r#"
[project]
requires-python = ">=3.10"

[tool.poetry.dependencies]
python = "~3.8"
"#,
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::ConflictingConstraints]);
        assert_eq!(violations[0].field, "python");
    }

    #[test]
    fn test_sources_without_constraint_are_skipped() {
        let violations = check(
            r#"
[tool.poetry.dependencies]
lib = { path = "../lib" }

[tool.poetry.dev-dependencies]
lib = "^1.0"
"#,
        );
        assert!(violations.is_empty());
    }
}
