//! Integration tests for configuration loading

use std::fs;
use std::path::PathBuf;

use cfgcheck_meta::{
    ConfigSource, DependencyGroup, Error, InputFormat, ToolKind, load_configuration,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/pyproject")
        .join(name)
}

// ============================================================================
// Sections and data model
// ============================================================================

#[test]
fn test_load_clean_fixture() {
    let model = load_configuration(&ConfigSource::file(fixture("clean.toml"))).unwrap();

    assert_eq!(model.python.len(), 1);
    assert_eq!(model.python[0].section, "tool.poetry.dependencies");

    let main = model
        .dependencies
        .iter()
        .filter(|d| d.group == DependencyGroup::Main)
        .count();
    let dev = model
        .dependencies
        .iter()
        .filter(|d| d.group == DependencyGroup::Dev)
        .count();
    assert_eq!(main, 9);
    assert_eq!(dev, 9);

    let celery = model.dependencies_named("celery").next().unwrap();
    assert_eq!(celery.constraint.as_deref(), Some("^4.4"));
    assert!(celery.extras.contains("redis"));

    let black = model.tool(&ToolKind::Black).unwrap();
    assert_eq!(black.int_value("line-length"), Some(90));
    assert!(model.tool(&ToolKind::Unknown("django-stubs".to_string())).is_some());
}

#[test]
fn test_mypy_overrides_become_ignore_rules() {
    let model = load_configuration(&ConfigSource::file(fixture("clean.toml"))).unwrap();

    assert_eq!(model.overrides.len(), 2);
    assert_eq!(model.overrides[1].modules, vec!["ws.tests.*".to_string()]);

    let mypy_patterns: Vec<&str> = model
        .ignore_rules
        .iter()
        .filter(|r| r.tool == ToolKind::Mypy)
        .map(|r| r.pattern.as_str())
        .collect();
    assert_eq!(
        mypy_patterns,
        vec!["celery.*", "kombu.*", "localflavor.*", "pipeline.*"]
    );
    assert!(
        model
            .ignore_rules
            .iter()
            .filter(|r| r.tool == ToolKind::Mypy)
            .all(|r| r.reason.as_deref() == Some("ignore_missing_imports")
                && r.section == "tool.mypy.overrides[0]")
    );
}

#[test]
fn test_pylint_ignored_modules_become_ignore_rules() {
    let model = load_configuration(&ConfigSource::file(fixture("clean.toml"))).unwrap();

    let pylint: Vec<_> = model
        .ignore_rules
        .iter()
        .filter(|r| r.tool == ToolKind::Pylint)
        .collect();
    assert_eq!(pylint.len(), 1);
    assert_eq!(pylint[0].pattern, "celery");
    assert_eq!(pylint[0].section, "tool.pylint.TYPECHECK");
}

#[test]
fn test_pep621_project_table() {
    let text = r#"
[project]
name = "ws"
requires-python = ">=3.8"
dependencies = ["Django>=2.2,<3.0", "celery[redis]~=4.4"]

[project.optional-dependencies]
test = ["pytest>=6.1", "factory_boy"]
"#;
    let model = load_configuration(&ConfigSource::inline(text)).unwrap();

    assert_eq!(model.python[0].constraint, ">=3.8");
    assert_eq!(model.python[0].field, "requires-python");
    assert_eq!(model.dependencies.len(), 4);
    assert_eq!(model.dependencies[1].constraint.as_deref(), Some("~=4.4"));
    assert_eq!(model.dependencies[2].group, DependencyGroup::Dev);
    assert_eq!(model.dependencies[2].section, "project.optional-dependencies.test");
    assert_eq!(model.dependencies[3].constraint, None);
}

#[test]
fn test_poetry_groups_are_dev() {
    let text = r#"
[tool.poetry.group.test.dependencies]
pytest = "^6.1"

[tool.poetry.group.lint.dependencies]
pylint = "^2.6"
"#;
    let model = load_configuration(&ConfigSource::inline(text)).unwrap();
    assert!(model.dependencies.iter().all(|d| d.group == DependencyGroup::Dev));
    assert_eq!(model.dependencies[0].section, "tool.poetry.group.lint.dependencies");
}

// ============================================================================
// Formats
// ============================================================================

#[rstest]
#[case("clean.json")]
#[case("clean.yaml")]
fn test_other_formats_load_like_toml(#[case] name: &str) {
    let model = load_configuration(&ConfigSource::file(fixture(name))).unwrap();

    assert_eq!(model.python[0].constraint, "^3.8");
    assert_eq!(model.dependencies.len(), 3);
    assert_eq!(
        model.tool(&ToolKind::Isort).and_then(|t| t.str_value("profile")),
        Some("black")
    );
}

#[test]
fn test_format_override_for_unusual_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pyproject.conf");
    fs::write(&path, "[tool.black]\nline-length = 100\n").unwrap();

    let err = load_configuration(&ConfigSource::file(&path)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));

    let source = ConfigSource::file(&path).with_format(InputFormat::Toml);
    let model = load_configuration(&source).unwrap();
    assert_eq!(
        model.tool(&ToolKind::Black).and_then(|t| t.int_value("line_length")),
        Some(100)
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_malformed_fixture_is_parse_error() {
    let err = load_configuration(&ConfigSource::file(fixture("malformed.toml"))).unwrap_err();
    assert!(matches!(err, Error::Parse { format: InputFormat::Toml, .. }));
}

#[rstest]
#[case("[tool.isort\nprofile = \"black\"")]
#[case("[tool.black]\nline-length = ")]
#[case("tool = [")]
fn test_truncated_inline_text_is_parse_error(#[case] text: &str) {
    let err = load_configuration(&ConfigSource::inline(text)).unwrap_err();
    assert!(err.is_parse_failure(), "expected parse failure, got {err}");
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err =
        load_configuration(&ConfigSource::file(temp.path().join("pyproject.toml"))).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(!err.is_parse_failure());
}

#[test]
fn test_wrong_dependency_shape_is_structure_error() {
    let err = load_configuration(&ConfigSource::inline("[project]\ndependencies = \"django\"\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Structure { ref section, .. } if section == "project.dependencies"
    ));
}
