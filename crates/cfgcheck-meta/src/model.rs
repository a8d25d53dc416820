//! The immutable configuration model
//!
//! Everything a validation run looks at is built once by
//! [`load_configuration`](crate::load_configuration) and never mutated
//! afterwards.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::requirement::normalize_name;

/// Name of the table holding this tool's own settings.
pub const VALIDATOR_TOOL_NAME: &str = "validate-config";

/// Dependency group a package is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyGroup {
    /// Runtime dependencies.
    Main,
    /// Development, test and other optional groups.
    Dev,
}

impl fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyGroup::Main => write!(f, "main"),
            DependencyGroup::Dev => write!(f, "dev"),
        }
    }
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Name as written in the document.
    pub name: String,
    /// Raw constraint text; `None` for git/path/url sources.
    pub constraint: Option<String>,
    pub group: DependencyGroup,
    pub extras: BTreeSet<String>,
    /// Dotted path of the declaring table, e.g. `tool.poetry.dev-dependencies`.
    pub section: String,
}

impl DependencySpec {
    /// PEP 503 normalized name, used for all identity comparisons.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// The interpreter range a project declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRequirement {
    pub constraint: String,
    pub section: String,
    pub field: String,
}

/// Tools with a known settings schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    /// Dependency manager (`[tool.poetry]`)
    Poetry,
    /// Formatter (`[tool.black]`)
    Black,
    /// Import sorter (`[tool.isort]`)
    Isort,
    /// Type checker (`[tool.mypy]`)
    Mypy,
    /// Linter (`[tool.pylint.*]`)
    Pylint,
    /// Test runner (`[tool.pytest.ini_options]`)
    Pytest,
    /// This validator's own settings (`[tool.validate-config]`)
    Validator,
    /// Any other tool; kept but not schema checked.
    Unknown(String),
}

impl ToolKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "poetry" => ToolKind::Poetry,
            "black" => ToolKind::Black,
            "isort" => ToolKind::Isort,
            "mypy" => ToolKind::Mypy,
            "pylint" => ToolKind::Pylint,
            "pytest" => ToolKind::Pytest,
            VALIDATOR_TOOL_NAME => ToolKind::Validator,
            other => ToolKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolKind::Poetry => "poetry",
            ToolKind::Black => "black",
            ToolKind::Isort => "isort",
            ToolKind::Mypy => "mypy",
            ToolKind::Pylint => "pylint",
            ToolKind::Pytest => "pytest",
            ToolKind::Validator => VALIDATOR_TOOL_NAME,
            ToolKind::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ToolKind::Unknown(_))
    }

    /// Canonical spelling of a setting key for this tool.
    ///
    /// black, isort and mypy read `line-length` and `line_length` alike.
    /// Pylint section names are case and separator insensitive
    /// (`'MESSAGES CONTROL'` is `messages_control`) and its options are
    /// dashed.
    pub fn normalize_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            ToolKind::Black | ToolKind::Isort | ToolKind::Mypy => Cow::Owned(key.replace('-', "_")),
            ToolKind::Pylint => match key.split_once('.') {
                Some((section, option)) => Cow::Owned(format!(
                    "{}.{}",
                    normalize_pylint_section(section),
                    option.replace('_', "-")
                )),
                None => Cow::Owned(key.replace('_', "-")),
            },
            _ => Cow::Borrowed(key),
        }
    }
}

/// Pylint section names compare case-insensitively with spaces and dashes
/// treated as underscores.
pub fn normalize_pylint_section(section: &str) -> String {
    section.trim().to_lowercase().replace([' ', '-'], "_")
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single key/value setting of a tool section.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSetting {
    pub tool: ToolKind,
    /// Key as written. Nested sections are flattened with a dot
    /// (`ini_options.addopts`, `FORMAT.max-line-length`).
    pub key: String,
    pub value: toml::Value,
}

/// A `[tool.<name>]` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSection {
    pub kind: ToolKind,
    /// Dotted path, e.g. `tool.isort`.
    pub section: String,
    pub settings: Vec<ToolSetting>,
}

impl ToolSection {
    /// Look a setting up by key, honoring the tool's key spelling rules.
    pub fn get(&self, key: &str) -> Option<&ToolSetting> {
        let wanted = self.kind.normalize_key(key);
        self.settings
            .iter()
            .find(|s| self.kind.normalize_key(&s.key) == wanted)
    }

    pub fn value(&self, key: &str) -> Option<&toml::Value> {
        self.get(key).map(|s| &s.value)
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(toml::Value::as_str)
    }

    pub fn int_value(&self, key: &str) -> Option<i64> {
        self.value(key).and_then(toml::Value::as_integer)
    }

    /// Read a setting that may be a list of strings or a comma separated
    /// string. Non-string entries are skipped.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.value(key) {
            Some(value) => string_list(value),
            None => Vec::new(),
        }
    }

    /// Build the dotted section path of a setting.
    pub fn setting_path(&self, setting: &ToolSetting) -> String {
        match setting.key.rsplit_once('.') {
            Some((parent, _)) => format!("{}.{}", self.section, parent),
            None => self.section.clone(),
        }
    }
}

/// Flatten a string or list-of-strings value.
pub fn string_list(value: &toml::Value) -> Vec<String> {
    match value {
        toml::Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        toml::Value::Array(items) => items
            .iter()
            .filter_map(toml::Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// A module pattern whose diagnostics a tool is told to suppress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pub pattern: String,
    /// The option that causes the suppression, e.g. `ignore_missing_imports`.
    pub reason: Option<String>,
    pub tool: ToolKind,
    /// Dotted path of the declaring table.
    pub section: String,
}

/// Settings scoped to a set of module patterns (`[[tool.mypy.overrides]]`).
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRule {
    pub tool: ToolKind,
    /// Position within the override array.
    pub index: usize,
    pub modules: Vec<String>,
    pub settings: BTreeMap<String, toml::Value>,
}

impl OverrideRule {
    /// Dotted path used in diagnostics, e.g. `tool.mypy.overrides[1]`.
    pub fn section(&self) -> String {
        format!("tool.{}.overrides[{}]", self.tool, self.index)
    }
}

/// The parsed configuration document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigModel {
    /// Where the document came from (file path or `<inline>`).
    pub origin: String,
    pub python: Vec<PythonRequirement>,
    pub dependencies: Vec<DependencySpec>,
    pub tools: Vec<ToolSection>,
    pub ignore_rules: Vec<IgnoreRule>,
    pub overrides: Vec<OverrideRule>,
}

impl ConfigModel {
    /// Find the section of a tool, if declared.
    pub fn tool(&self, kind: &ToolKind) -> Option<&ToolSection> {
        self.tools.iter().find(|t| &t.kind == kind)
    }

    /// All dependencies whose normalized name equals `name`'s.
    pub fn dependencies_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a DependencySpec> {
        let wanted = normalize_name(name);
        self.dependencies
            .iter()
            .filter(move |d| d.normalized_name() == wanted)
    }

    pub fn declares_dependency(&self, name: &str) -> bool {
        self.dependencies_named(name).next().is_some()
    }
}
