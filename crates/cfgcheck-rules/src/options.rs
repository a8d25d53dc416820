//! Validator options
//!
//! Options come from two places: the `[tool.validate-config]` table of the
//! document being checked, and the command line. Command line strictness is
//! OR-ed with the document's.

use std::collections::BTreeSet;

use cfgcheck_meta::{ConfigModel, ToolKind};
use serde::Deserialize;

use crate::violation::ViolationKind;

/// Options controlling one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Warnings count as violations.
    pub strict: bool,
    /// Kinds whose violations are dropped.
    pub disabled: BTreeSet<ViolationKind>,
}

/// Shape of `[tool.validate-config]`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DocumentSettings {
    strict: bool,
    disable: Vec<String>,
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn disable(mut self, kind: ViolationKind) -> Self {
        self.disabled.insert(kind);
        self
    }

    /// Read options from the document's own settings table.
    ///
    /// A table of the wrong shape is reported by the schema pass; here it
    /// only falls back to the defaults. Unknown kind names are skipped.
    pub fn from_model(model: &ConfigModel) -> Self {
        let Some(section) = model.tool(&ToolKind::Validator) else {
            return Self::default();
        };

        let table: toml::Table = section
            .settings
            .iter()
            .map(|setting| (setting.key.clone(), setting.value.clone()))
            .collect();

        let settings = match toml::Value::Table(table).try_into::<DocumentSettings>() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    section = %section.section,
                    error = %e,
                    "ignoring malformed validator settings"
                );
                return Self::default();
            }
        };

        let disabled = settings
            .disable
            .iter()
            .filter_map(|name| match name.parse::<ViolationKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping disabled kind");
                    None
                }
            })
            .collect();

        Self {
            strict: settings.strict,
            disabled,
        }
    }

    /// Apply command line overrides on top of document settings.
    pub fn merge_cli(mut self, strict: bool) -> Self {
        self.strict |= strict;
        self
    }

    pub fn is_enabled(&self, kind: ViolationKind) -> bool {
        !self.disabled.contains(&kind)
    }
}
