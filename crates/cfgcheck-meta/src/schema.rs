//! Key schemas for the tools the validator understands

use std::collections::{HashMap, HashSet};

use crate::model::{ToolKind, normalize_pylint_section};

/// Expected shape of a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Boolean,
    StringList,
    /// A list of strings or a single (possibly comma separated) string.
    StringOrList,
    Table,
    TableList,
    Any,
}

impl ValueType {
    pub fn accepts(&self, value: &toml::Value) -> bool {
        use toml::Value;

        let is_string_list =
            |v: &Value| v.as_array().is_some_and(|items| items.iter().all(Value::is_str));

        match self {
            ValueType::String => value.is_str(),
            ValueType::Integer => value.is_integer(),
            ValueType::Boolean => value.is_bool(),
            ValueType::StringList => is_string_list(value),
            ValueType::StringOrList => value.is_str() || is_string_list(value),
            ValueType::Table => value.is_table(),
            ValueType::TableList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_table)),
            ValueType::Any => true,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ValueType::String => "a string",
            ValueType::Integer => "an integer",
            ValueType::Boolean => "a boolean",
            ValueType::StringList => "a list of strings",
            ValueType::StringOrList => "a string or a list of strings",
            ValueType::Table => "a table",
            ValueType::TableList => "an array of tables",
            ValueType::Any => "any value",
        }
    }
}

/// Result of looking a key up in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLookup {
    Known(ValueType),
    Unknown,
}

/// The keys one tool accepts, stored in the tool's canonical spelling.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    kind: ToolKind,
    keys: HashMap<&'static str, ValueType>,
    /// Sub-tables whose own keys are not checked (pylint option groups).
    sections: HashSet<&'static str>,
}

impl ToolSchema {
    fn new(kind: ToolKind, keys: &[(&'static str, ValueType)]) -> Self {
        Self {
            kind,
            keys: keys.iter().copied().collect(),
            sections: HashSet::new(),
        }
    }

    fn with_sections(mut self, sections: &[&'static str]) -> Self {
        self.sections = sections.iter().copied().collect();
        self
    }

    pub fn lookup(&self, key: &str) -> KeyLookup {
        let key = self.kind.normalize_key(key);
        if let Some(ty) = self.keys.get(key.as_ref()) {
            return KeyLookup::Known(*ty);
        }
        match key.split_once('.') {
            Some((section, _))
                if self.sections.contains(normalize_pylint_section(section).as_str()) =>
            {
                KeyLookup::Known(ValueType::Any)
            }
            _ => KeyLookup::Unknown,
        }
    }

    pub fn is_known_key(&self, key: &str) -> bool {
        matches!(self.lookup(key), KeyLookup::Known(_))
    }
}

/// Registry of key schemas for known tools
pub struct SchemaRegistry {
    schemas: HashMap<ToolKind, ToolSchema>,
    mypy_overrides: ToolSchema,
}

impl SchemaRegistry {
    pub fn with_builtins() -> Self {
        let schemas = [
            poetry_schema(),
            black_schema(),
            isort_schema(),
            mypy_schema(),
            pylint_schema(),
            pytest_schema(),
            validator_schema(),
        ]
        .into_iter()
        .map(|schema| (schema.kind.clone(), schema))
        .collect();

        Self {
            schemas,
            mypy_overrides: mypy_override_schema(),
        }
    }

    /// The schema of a known tool; `None` for unknown tools.
    pub fn schema(&self, kind: &ToolKind) -> Option<&ToolSchema> {
        self.schemas.get(kind)
    }

    /// Keys accepted inside a `[[tool.mypy.overrides]]` block.
    pub fn override_schema(&self) -> &ToolSchema {
        &self.mypy_overrides
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn poetry_schema() -> ToolSchema {
    use ValueType::*;
    ToolSchema::new(
        ToolKind::Poetry,
        &[
            ("name", String),
            ("version", String),
            ("description", String),
            ("license", String),
            ("authors", StringList),
            ("maintainers", StringList),
            ("readme", StringOrList),
            ("homepage", String),
            ("repository", String),
            ("documentation", String),
            ("keywords", StringList),
            ("classifiers", StringList),
            ("packages", TableList),
            ("include", Any),
            ("exclude", Any),
            ("dependencies", Table),
            ("dev-dependencies", Table),
            ("group", Table),
            ("extras", Table),
            ("scripts", Table),
            ("plugins", Table),
            ("urls", Table),
            ("source", TableList),
            ("package-mode", Boolean),
            ("build", Any),
        ],
    )
}

fn black_schema() -> ToolSchema {
    use ValueType::*;
    ToolSchema::new(
        ToolKind::Black,
        &[
            ("line_length", Integer),
            ("target_version", StringOrList),
            ("skip_string_normalization", Boolean),
            ("skip_magic_trailing_comma", Boolean),
            ("skip_source_first_line", Boolean),
            ("include", String),
            ("exclude", String),
            ("extend_exclude", String),
            ("force_exclude", String),
            ("preview", Boolean),
            ("unstable", Boolean),
            ("enable_unstable_feature", StringList),
            ("required_version", String),
            ("pyi", Boolean),
            ("ipynb", Boolean),
            ("python_cell_magics", StringList),
            ("check", Boolean),
            ("diff", Boolean),
            ("color", Boolean),
            ("fast", Boolean),
            ("quiet", Boolean),
            ("verbose", Boolean),
            ("workers", Integer),
            ("line_ranges", StringList),
        ],
    )
}

fn isort_schema() -> ToolSchema {
    use ValueType::*;
    ToolSchema::new(
        ToolKind::Isort,
        &[
            ("profile", String),
            ("line_length", Integer),
            ("wrap_length", Integer),
            ("multi_line_output", Integer),
            ("include_trailing_comma", Boolean),
            ("force_grid_wrap", Integer),
            ("use_parentheses", Boolean),
            ("ensure_newline_before_comments", Boolean),
            ("split_on_trailing_comma", Boolean),
            ("known_first_party", StringOrList),
            ("known_third_party", StringOrList),
            ("known_local_folder", StringOrList),
            ("known_django", StringOrList),
            ("sections", StringOrList),
            ("default_section", String),
            ("no_lines_before", StringOrList),
            ("skip", StringOrList),
            ("skip_glob", StringOrList),
            ("extend_skip", StringOrList),
            ("extend_skip_glob", StringOrList),
            ("skip_gitignore", Boolean),
            ("src_paths", StringOrList),
            ("force_sort_within_sections", Boolean),
            ("force_single_line", Boolean),
            ("force_alphabetical_sort", Boolean),
            ("combine_as_imports", Boolean),
            ("lines_after_imports", Integer),
            ("lines_between_types", Integer),
            ("order_by_type", Boolean),
            ("case_sensitive", Boolean),
            ("atomic", Boolean),
            ("float_to_top", Boolean),
            ("filter_files", Boolean),
            ("honor_noqa", Boolean),
            ("balanced_wrapping", Boolean),
            ("indent", Any),
            ("py_version", Any),
            ("treat_comments_as_code", StringOrList),
        ],
    )
}

/// Options mypy accepts both globally and per module.
const MYPY_PER_MODULE: &[(&str, ValueType)] = &[
    ("ignore_missing_imports", ValueType::Boolean),
    ("ignore_errors", ValueType::Boolean),
    ("follow_imports", ValueType::String),
    ("follow_imports_for_stubs", ValueType::Boolean),
    ("disallow_untyped_defs", ValueType::Boolean),
    ("disallow_incomplete_defs", ValueType::Boolean),
    ("disallow_untyped_calls", ValueType::Boolean),
    ("disallow_untyped_decorators", ValueType::Boolean),
    ("disallow_any_generics", ValueType::Boolean),
    ("disallow_any_unimported", ValueType::Boolean),
    ("disallow_any_expr", ValueType::Boolean),
    ("disallow_any_decorated", ValueType::Boolean),
    ("disallow_any_explicit", ValueType::Boolean),
    ("disallow_subclassing_any", ValueType::Boolean),
    ("check_untyped_defs", ValueType::Boolean),
    ("no_implicit_optional", ValueType::Boolean),
    ("strict_optional", ValueType::Boolean),
    ("warn_return_any", ValueType::Boolean),
    ("warn_no_return", ValueType::Boolean),
    ("warn_unreachable", ValueType::Boolean),
    ("warn_unused_ignores", ValueType::Boolean),
    ("implicit_reexport", ValueType::Boolean),
    ("strict_equality", ValueType::Boolean),
    ("allow_redefinition", ValueType::Boolean),
    ("local_partial_types", ValueType::Boolean),
    ("enable_error_code", ValueType::StringOrList),
    ("disable_error_code", ValueType::StringOrList),
    ("always_true", ValueType::StringOrList),
    ("always_false", ValueType::StringOrList),
    ("extra_checks", ValueType::Boolean),
];

fn mypy_schema() -> ToolSchema {
    use ValueType::*;
    let mut schema = ToolSchema::new(
        ToolKind::Mypy,
        &[
            ("python_version", String),
            ("platform", String),
            ("python_executable", String),
            ("plugins", StringOrList),
            ("files", StringOrList),
            ("exclude", StringOrList),
            ("mypy_path", StringOrList),
            ("namespace_packages", Boolean),
            ("explicit_package_bases", Boolean),
            ("strict", Boolean),
            ("warn_unused_configs", Boolean),
            ("warn_redundant_casts", Boolean),
            ("warn_incomplete_stub", Boolean),
            ("no_implicit_reexport", Boolean),
            ("show_error_codes", Boolean),
            ("show_error_context", Boolean),
            ("show_column_numbers", Boolean),
            ("show_absolute_path", Boolean),
            ("show_traceback", Boolean),
            ("pretty", Boolean),
            ("color_output", Boolean),
            ("error_summary", Boolean),
            ("cache_dir", String),
            ("sqlite_cache", Boolean),
            ("incremental", Boolean),
            ("install_types", Boolean),
            ("non_interactive", Boolean),
            ("no_site_packages", Boolean),
            ("no_silence_site_packages", Boolean),
            ("overrides", TableList),
        ],
    );
    schema.keys.extend(MYPY_PER_MODULE.iter().copied());
    schema
}

fn mypy_override_schema() -> ToolSchema {
    let mut schema = ToolSchema::new(ToolKind::Mypy, MYPY_PER_MODULE);
    schema.keys.insert("module", ValueType::StringOrList);
    schema
}

fn pylint_schema() -> ToolSchema {
    ToolSchema::new(ToolKind::Pylint, &[]).with_sections(&[
        "main",
        "master",
        "messages_control",
        "reports",
        "format",
        "basic",
        "typecheck",
        "variables",
        "similarities",
        "logging",
        "spelling",
        "miscellaneous",
        "string",
        "imports",
        "classes",
        "design",
        "exceptions",
        "refactoring",
        "method_args",
    ])
}

fn pytest_schema() -> ToolSchema {
    use ValueType::*;
    ToolSchema::new(
        ToolKind::Pytest,
        &[
            ("ini_options.addopts", StringOrList),
            ("ini_options.minversion", String),
            ("ini_options.testpaths", StringOrList),
            ("ini_options.python_files", StringOrList),
            ("ini_options.python_classes", StringOrList),
            ("ini_options.python_functions", StringOrList),
            ("ini_options.norecursedirs", StringOrList),
            ("ini_options.markers", StringOrList),
            ("ini_options.filterwarnings", StringOrList),
            ("ini_options.usefixtures", StringOrList),
            ("ini_options.required_plugins", StringOrList),
            ("ini_options.xfail_strict", Boolean),
            ("ini_options.empty_parameter_set_mark", String),
            ("ini_options.console_output_style", String),
            ("ini_options.doctest_optionflags", StringOrList),
            ("ini_options.junit_family", String),
            ("ini_options.cache_dir", String),
            ("ini_options.log_cli", Boolean),
            ("ini_options.log_cli_level", String),
            ("ini_options.log_level", String),
            ("ini_options.log_format", String),
            ("ini_options.DJANGO_SETTINGS_MODULE", String),
            ("ini_options.django_find_project", Boolean),
            ("ini_options.django_debug_mode", Any),
            ("ini_options.FAIL_INVALID_TEMPLATE_VARS", Boolean),
            ("ini_options.asyncio_mode", String),
            ("ini_options.timeout", Any),
        ],
    )
}

fn validator_schema() -> ToolSchema {
    ToolSchema::new(
        ToolKind::Validator,
        &[("strict", ValueType::Boolean), ("disable", ValueType::StringList)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_knows_builtins() {
        let registry = SchemaRegistry::with_builtins();
        assert!(registry.schema(&ToolKind::Black).is_some());
        assert!(registry.schema(&ToolKind::Isort).is_some());
        assert!(registry.schema(&ToolKind::Unknown("coverage".into())).is_none());
        for kind in [ToolKind::Poetry, ToolKind::Mypy, ToolKind::Pylint, ToolKind::Validator] {
            assert!(registry.schema(&kind).is_some(), "{kind:?}");
        }
    }

    #[test]
    fn test_black_lookup_accepts_dashed_keys() {
        let registry = SchemaRegistry::with_builtins();
        let black = registry.schema(&ToolKind::Black).unwrap();
        assert_eq!(black.lookup("line-length"), KeyLookup::Known(ValueType::Integer));
        assert_eq!(black.lookup("line-lenght"), KeyLookup::Unknown);
    }

    #[test]
    fn test_pylint_sections_are_open() {
        let registry = SchemaRegistry::with_builtins();
        let pylint = registry.schema(&ToolKind::Pylint).unwrap();
        assert!(pylint.is_known_key("MESSAGES CONTROL.disable"));
        assert!(pylint.is_known_key("format.max-line-length"));
        assert!(!pylint.is_known_key("formatting.max-line-length"));
    }

    #[test]
    fn test_mypy_override_schema_excludes_global_options() {
        let registry = SchemaRegistry::with_builtins();
        let overrides = registry.override_schema();
        assert!(overrides.is_known_key("module"));
        assert!(overrides.is_known_key("ignore_missing_imports"));
        assert!(!overrides.is_known_key("python_version"));
    }

    #[test]
    fn test_value_types() {
        assert!(ValueType::StringOrList.accepts(&toml::Value::String("ws".into())));
        assert!(ValueType::StringList.accepts(&toml::Value::Array(vec!["a".into()])));
        assert!(!ValueType::StringList.accepts(&toml::Value::Array(vec![1.into()])));
        assert!(!ValueType::Integer.accepts(&toml::Value::String("88".into())));
    }
}
