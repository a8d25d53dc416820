//! Per-tool key and value checks

use cfgcheck_meta::model::string_list;
use cfgcheck_meta::schema::ToolSchema;
use cfgcheck_meta::{ConfigModel, KeyLookup, SchemaRegistry, ToolKind, ToolSection, ToolSetting};

use crate::violation::{Violation, ViolationKind};

/// Check every setting of every known tool against its schema.
///
/// Sections of unknown tools are skipped. Mypy override blocks are held to
/// the narrower per-module schema and must name their modules.
pub fn validate_tool_schemas(model: &ConfigModel) -> Vec<Violation> {
    validate_with_registry(model, &SchemaRegistry::with_builtins())
}

pub fn validate_with_registry(model: &ConfigModel, registry: &SchemaRegistry) -> Vec<Violation> {
    let mut violations = Vec::new();

    for section in &model.tools {
        let Some(schema) = registry.schema(&section.kind) else {
            tracing::debug!(section = %section.section, "no schema, skipping");
            continue;
        };
        for setting in &section.settings {
            let (path, key) = locate(section, setting);
            check_setting(schema, &path, key, &setting.key, &setting.value, &mut violations);
        }
        if section.kind == ToolKind::Validator {
            check_disabled_kinds(section, &mut violations);
        }
    }

    let per_module = registry.override_schema();
    for rule in &model.overrides {
        let section = rule.section();
        if rule.modules.is_empty() {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                &section,
                "module",
                "override block must name its modules with a string or a list of strings",
            ));
        }
        for (key, value) in &rule.settings {
            check_setting(per_module, &section, key, key, value, &mut violations);
        }
    }

    tracing::debug!(violations = violations.len(), "tool schemas checked");
    violations
}

/// Section path and leaf key of a possibly flattened setting.
fn locate<'a>(section: &ToolSection, setting: &'a ToolSetting) -> (String, &'a str) {
    let leaf = setting
        .key
        .rsplit_once('.')
        .map_or(setting.key.as_str(), |(_, leaf)| leaf);
    (section.setting_path(setting), leaf)
}

fn check_setting(
    schema: &ToolSchema,
    path: &str,
    field: &str,
    key: &str,
    value: &toml::Value,
    violations: &mut Vec<Violation>,
) {
    match schema.lookup(key) {
        KeyLookup::Known(expected) if !expected.accepts(value) => {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                path,
                field,
                format!("expected {}, found {}", expected.describe(), value.type_str()),
            ));
        }
        KeyLookup::Known(_) => {}
        KeyLookup::Unknown => {
            violations.push(Violation::new(
                ViolationKind::UnknownKey,
                path,
                field,
                format!("'{field}' is not a recognized option here"),
            ));
        }
    }
}

fn check_disabled_kinds(section: &ToolSection, violations: &mut Vec<Violation>) {
    let Some(setting) = section.get("disable") else {
        return;
    };
    for name in string_list(&setting.value) {
        if let Err(e) = name.parse::<ViolationKind>() {
            violations.push(Violation::new(
                ViolationKind::InvalidValue,
                &section.section,
                &setting.key,
                e.to_string(),
            ));
        }
    }
}
