//! Builds a [`ConfigModel`] from a decoded document
//!
//! The loader understands the layout of a Python `pyproject.toml`:
//!
//! ```text
//! [project]                      requires-python, dependencies, optional-dependencies
//! [tool.poetry.dependencies]     main group (python = interpreter range)
//! [tool.poetry.dev-dependencies] dev group
//! [tool.poetry.group.<g>.dependencies]
//! [tool.black] [tool.isort] [tool.mypy] [[tool.mypy.overrides]]
//! [tool.pylint.<section>] [tool.pytest.ini_options]
//! [tool.validate-config]
//! ```
//!
//! Only structural problems (a section with the wrong shape) fail the load;
//! everything else is left to the validation passes.

use std::collections::BTreeMap;

use toml::{Table, Value};

use crate::model::{
    ConfigModel, DependencyGroup, DependencySpec, IgnoreRule, OverrideRule, PythonRequirement,
    ToolKind, ToolSection, ToolSetting, string_list,
};
use crate::requirement::Requirement;
use crate::source::ConfigSource;
use crate::{Error, Result};

/// Mypy per-module options that silence diagnostics for matching modules.
const MYPY_SUPPRESSING_OPTIONS: &[&str] = &["ignore_missing_imports", "ignore_errors"];

/// Keys of a Poetry dependency table that point at a non-index source.
const DIRECT_SOURCE_KEYS: &[&str] = &["git", "path", "url", "file"];

/// Read and parse a configuration document.
pub fn load_configuration(source: &ConfigSource) -> Result<ConfigModel> {
    let document = source.read_document()?;
    build_model(&source.origin(), &document)
}

/// Parse an already decoded document.
pub fn build_model(origin: &str, document: &Table) -> Result<ConfigModel> {
    let mut loader = ModelBuilder {
        origin,
        model: ConfigModel {
            origin: origin.to_string(),
            ..ConfigModel::default()
        },
    };

    if let Some(project) = document.get("project") {
        let project = expect_table(origin, "project", project)?;
        loader.load_project(project)?;
    }

    if let Some(tools) = document.get("tool") {
        let tools = expect_table(origin, "tool", tools)?;
        for (name, value) in tools {
            let section = format!("tool.{name}");
            let table = expect_table(origin, &section, value)?;
            loader.load_tool(name, section, table)?;
        }
    }

    for key in document.keys().filter(|k| !matches!(k.as_str(), "project" | "tool")) {
        tracing::debug!(section = %key, "ignoring top-level table");
    }

    tracing::debug!(
        origin,
        dependencies = loader.model.dependencies.len(),
        tools = loader.model.tools.len(),
        ignore_rules = loader.model.ignore_rules.len(),
        "configuration loaded"
    );

    Ok(loader.model)
}

struct ModelBuilder<'a> {
    origin: &'a str,
    model: ConfigModel,
}

impl ModelBuilder<'_> {
    fn load_project(&mut self, project: &Table) -> Result<()> {
        if let Some(value) = project.get("requires-python") {
            let constraint = expect_str(self.origin, "project.requires-python", value)?;
            self.model.python.push(PythonRequirement {
                constraint: constraint.to_string(),
                section: "project".to_string(),
                field: "requires-python".to_string(),
            });
        }

        if let Some(value) = project.get("dependencies") {
            self.load_requirements("project.dependencies", DependencyGroup::Main, value)?;
        }

        if let Some(value) = project.get("optional-dependencies") {
            let groups = expect_table(self.origin, "project.optional-dependencies", value)?;
            for (group, requirements) in groups {
                let section = format!("project.optional-dependencies.{group}");
                self.load_requirements(&section, DependencyGroup::Dev, requirements)?;
            }
        }

        Ok(())
    }

    fn load_requirements(
        &mut self,
        section: &str,
        group: DependencyGroup,
        value: &Value,
    ) -> Result<()> {
        let Some(items) = value.as_array() else {
            return Err(Error::structure(
                self.origin,
                section,
                "expected an array of requirement strings",
            ));
        };

        for item in items {
            let text = expect_str(self.origin, section, item)?;
            let requirement = Requirement::parse(text).ok_or_else(|| {
                Error::structure(self.origin, section, format!("invalid requirement '{text}'"))
            })?;
            self.model.dependencies.push(DependencySpec {
                name: requirement.name,
                constraint: requirement.constraint,
                group,
                extras: requirement.extras,
                section: section.to_string(),
            });
        }

        Ok(())
    }

    fn load_tool(&mut self, name: &str, section: String, table: &Table) -> Result<()> {
        let kind = ToolKind::from_name(name);
        let settings = match kind {
            ToolKind::Pylint | ToolKind::Pytest => flatten_one_level(&kind, table),
            _ => table
                .iter()
                .map(|(key, value)| ToolSetting {
                    tool: kind.clone(),
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        };

        match kind {
            ToolKind::Poetry => self.load_poetry(table)?,
            ToolKind::Mypy => self.load_mypy_overrides(table),
            ToolKind::Pylint => self.load_pylint_ignores(&section, &settings),
            ToolKind::Unknown(_) => {
                tracing::debug!(%section, "keeping section of unknown tool without schema checks");
            }
            _ => {}
        }

        self.model.tools.push(ToolSection {
            kind,
            section,
            settings,
        });
        Ok(())
    }

    fn load_poetry(&mut self, poetry: &Table) -> Result<()> {
        if let Some(value) = poetry.get("dependencies") {
            self.load_poetry_dependencies(
                "tool.poetry.dependencies",
                DependencyGroup::Main,
                value,
            )?;
        }
        if let Some(value) = poetry.get("dev-dependencies") {
            self.load_poetry_dependencies(
                "tool.poetry.dev-dependencies",
                DependencyGroup::Dev,
                value,
            )?;
        }
        if let Some(groups) = poetry.get("group").and_then(Value::as_table) {
            for (group, body) in groups {
                if let Some(value) = body.get("dependencies") {
                    let section = format!("tool.poetry.group.{group}.dependencies");
                    self.load_poetry_dependencies(&section, DependencyGroup::Dev, value)?;
                }
            }
        }
        Ok(())
    }

    fn load_poetry_dependencies(
        &mut self,
        section: &str,
        group: DependencyGroup,
        value: &Value,
    ) -> Result<()> {
        let table = expect_table(self.origin, section, value)?;

        for (name, spec) in table {
            if name == "python" && group == DependencyGroup::Main {
                let constraint = expect_str(self.origin, &format!("{section}.python"), spec)?;
                self.model.python.push(PythonRequirement {
                    constraint: constraint.to_string(),
                    section: section.to_string(),
                    field: name.clone(),
                });
                continue;
            }

            let (constraint, extras) = match spec {
                Value::String(s) => (Some(s.clone()), Default::default()),
                Value::Table(t) => (table_constraint(t), string_list_set(t.get("extras"))),
                // Multiple constraints for different markers: any of them may apply
                Value::Array(entries) => {
                    let mut versions = Vec::new();
                    let mut extras = std::collections::BTreeSet::new();
                    for entry in entries {
                        let entry = expect_table(self.origin, &format!("{section}.{name}"), entry)?;
                        versions.extend(table_constraint(entry));
                        extras.extend(string_list_set(entry.get("extras")));
                    }
                    let constraint = (!versions.is_empty()).then(|| versions.join(" || "));
                    (constraint, extras)
                }
                other => {
                    return Err(Error::structure(
                        self.origin,
                        format!("{section}.{name}"),
                        format!("expected a version string or table, found {}", other.type_str()),
                    ));
                }
            };

            self.model.dependencies.push(DependencySpec {
                name: name.clone(),
                constraint,
                group,
                extras,
                section: section.to_string(),
            });
        }

        Ok(())
    }

    /// Turn `[[tool.mypy.overrides]]` blocks into override rules, and the
    /// suppressing ones into ignore rules as well. Malformed blocks are kept
    /// for the schema pass to report.
    fn load_mypy_overrides(&mut self, mypy: &Table) {
        let Some(blocks) = mypy.get("overrides").and_then(Value::as_array) else {
            return;
        };

        for (index, block) in blocks.iter().enumerate() {
            let Some(block) = block.as_table() else {
                continue;
            };
            let modules = block.get("module").map(string_list).unwrap_or_default();
            let settings: BTreeMap<String, Value> = block
                .iter()
                .filter(|(key, _)| key.as_str() != "module")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            let rule = OverrideRule {
                tool: ToolKind::Mypy,
                index,
                modules,
                settings,
            };

            let reason = MYPY_SUPPRESSING_OPTIONS.iter().find(|option| {
                rule.settings
                    .iter()
                    .any(|(key, value)| {
                        key.replace('-', "_") == **option && value.as_bool() == Some(true)
                    })
            });
            if let Some(reason) = reason {
                for pattern in &rule.modules {
                    self.model.ignore_rules.push(IgnoreRule {
                        pattern: pattern.clone(),
                        reason: Some((*reason).to_string()),
                        tool: ToolKind::Mypy,
                        section: rule.section(),
                    });
                }
            }

            self.model.overrides.push(rule);
        }
    }

    fn load_pylint_ignores(&mut self, section: &str, settings: &[ToolSetting]) {
        for setting in settings {
            let Some((group, option)) = setting.key.split_once('.') else {
                continue;
            };
            if option.replace('_', "-") != "ignored-modules" {
                continue;
            }
            for pattern in string_list(&setting.value) {
                self.model.ignore_rules.push(IgnoreRule {
                    pattern,
                    reason: Some("ignored-modules".to_string()),
                    tool: ToolKind::Pylint,
                    section: format!("{section}.{group}"),
                });
            }
        }
    }
}

/// Flatten nested tables one level deep: `{ini_options = {addopts = ".."}}`
/// becomes `ini_options.addopts`.
fn flatten_one_level(kind: &ToolKind, table: &Table) -> Vec<ToolSetting> {
    let mut settings = Vec::new();
    for (key, value) in table {
        match value {
            Value::Table(inner) => {
                for (inner_key, inner_value) in inner {
                    settings.push(ToolSetting {
                        tool: kind.clone(),
                        key: format!("{key}.{inner_key}"),
                        value: inner_value.clone(),
                    });
                }
            }
            other => settings.push(ToolSetting {
                tool: kind.clone(),
                key: key.clone(),
                value: other.clone(),
            }),
        }
    }
    settings
}

fn table_constraint(table: &Table) -> Option<String> {
    if DIRECT_SOURCE_KEYS.iter().any(|key| table.contains_key(*key)) {
        return None;
    }
    table.get("version").and_then(Value::as_str).map(str::to_string)
}

fn string_list_set(value: Option<&Value>) -> std::collections::BTreeSet<String> {
    value.map(string_list).unwrap_or_default().into_iter().collect()
}

fn expect_table<'v>(origin: &str, section: &str, value: &'v Value) -> Result<&'v Table> {
    value.as_table().ok_or_else(|| {
        Error::structure(origin, section, format!("expected a table, found {}", value.type_str()))
    })
}

fn expect_str<'v>(origin: &str, section: &str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        Error::structure(origin, section, format!("expected a string, found {}", value.type_str()))
    })
}
