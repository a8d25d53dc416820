//! Rendering of reports

use cfgcheck_meta::{ConfigSource, load_configuration};
use cfgcheck_rules::{
    ExitStatus, OutputFormat, ReportOptions, Validator, ValidatorOptions, Violation, ViolationKind,
    report,
};

const PEP8_PROFILE: &str = r#"
[tool.black]
line-length = 88

[tool.isort]
profile = "pep8"
"#;

fn violations(text: &str) -> Vec<Violation> {
    let model = load_configuration(&ConfigSource::inline(text)).unwrap();
    Validator::new(&model, ValidatorOptions::new())
        .validate()
        .into_violations()
}

fn render(violations: &[Violation], options: ReportOptions) -> (String, ExitStatus) {
    let mut out = Vec::new();
    let status = report(violations, &options, &mut out).unwrap();
    (String::from_utf8(out).unwrap(), status)
}

#[test]
fn test_text_report_one_line_per_violation() {
    let (text, status) = render(&violations(PEP8_PROFILE), ReportOptions::default());

    assert_eq!(status, ExitStatus::Violations);
    insta::assert_snapshot!(text.trim_end(), @r###"
    error[profile-mismatch] tool.isort.profile: profile "pep8" does not match formatter black (expected "black")
    "###);
}

#[test]
fn test_json_report_document() {
    let options = ReportOptions {
        format: OutputFormat::Json,
        strict: false,
    };
    let (json, status) = render(&violations(PEP8_PROFILE), options);

    assert_eq!(status, ExitStatus::Violations);
    insta::assert_snapshot!(json.trim_end(), @r###"
{
  "violations": [
    {
      "kind": "profile-mismatch",
      "class": "consistency",
      "severity": "error",
      "section": "tool.isort",
      "field": "profile",
      "message": "profile \"pep8\" does not match formatter black (expected \"black\")"
    }
  ],
  "summary": {
    "errors": 1,
    "warnings": 0,
    "failing": 1,
    "strict": false
  }
}
"###);
}

#[test]
fn test_empty_report() {
    let (text, status) = render(&[], ReportOptions::default());
    assert_eq!(text, "");
    assert_eq!(status, ExitStatus::Success);

    let options = ReportOptions {
        format: OutputFormat::Json,
        strict: true,
    };
    let (json, _) = render(&[], options);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["violations"], serde_json::json!([]));
    assert_eq!(parsed["summary"]["strict"], serde_json::json!(true));
}

#[test]
fn test_strict_warning_fails() {
    let warnings = violations("[tool.black]\ncolour = true\n");
    assert_eq!(warnings[0].kind, ViolationKind::UnknownKey);

    let (_, relaxed) = render(&warnings, ReportOptions::default());
    assert_eq!(relaxed, ExitStatus::Success);

    let strict = ReportOptions {
        format: OutputFormat::Text,
        strict: true,
    };
    let (text, status) = render(&warnings, strict);
    assert_eq!(status, ExitStatus::Violations);
    assert!(text.starts_with("warning[unknown-key] tool.black.colour: "));
}

#[test]
fn test_newlines_from_the_document_stay_on_one_line() {
    let found = violations(
        r#"
[tool.black]
"line\nlength" = 90

[tool.poetry.dependencies]
foo = "^1.0\n^2.0"
"#,
    );
    let found_kinds: Vec<ViolationKind> = found.iter().map(|v| v.kind).collect();
    assert!(found_kinds.contains(&ViolationKind::UnknownKey), "{found:?}");
    assert!(found_kinds.contains(&ViolationKind::UnsatisfiableConstraint), "{found:?}");

    let (text, _) = render(&found, ReportOptions::default());
    assert_eq!(text.lines().count(), found.len(), "{text}");
    assert!(text.contains(r"tool.black.line\nlength"), "{text}");
    assert!(text.contains(r"'^1.0\n^2.0' admits no version"), "{text}");
}
