//! Configuration model and loading for validate-config.
//!
//! This crate turns a project configuration document (a `pyproject.toml`
//! or an equivalent JSON/YAML file) into an immutable [`ConfigModel`], and
//! provides the building blocks the validation passes reason with:
//! version constraints, module patterns and per-tool key schemas.

pub mod error;
pub mod loader;
pub mod model;
pub mod pattern;
pub mod requirement;
pub mod schema;
pub mod source;
pub mod version;

pub use error::{Error, Result};
pub use loader::{build_model, load_configuration};
pub use model::{
    ConfigModel, DependencyGroup, DependencySpec, IgnoreRule, OverrideRule, PythonRequirement,
    ToolKind, ToolSection, ToolSetting,
};
pub use pattern::{ModulePattern, PatternSyntax};
pub use schema::{KeyLookup, SchemaRegistry, ValueType};
pub use source::{ConfigSource, InputFormat};
pub use version::VersionConstraint;
