//! Ignore-rule hygiene

use std::collections::{BTreeMap, BTreeSet};

use cfgcheck_meta::{ConfigModel, IgnoreRule, ModulePattern, PatternSyntax, ToolKind};

use crate::violation::{Violation, ViolationKind};

fn parse_for(tool: &ToolKind, pattern: &str) -> cfgcheck_meta::Result<ModulePattern> {
    ModulePattern::parse_with(pattern, PatternSyntax::for_tool(tool))
}

/// Key that carries the patterns of an ignore rule.
fn pattern_field(tool: &ToolKind) -> &'static str {
    match tool {
        ToolKind::Mypy => "module",
        ToolKind::Pylint => "ignored-modules",
        _ => "",
    }
}

/// Check module patterns used by ignore rules and overrides.
///
/// Every pattern must parse, no pattern may appear twice for the same
/// tool, and no suppression may cover a first-party package.
pub fn validate_ignore_rules(model: &ConfigModel) -> Vec<Violation> {
    let mut violations = Vec::new();

    // Override blocks share their section with the ignore rules built from
    // them, and a block may list a pattern twice; check each pattern once.
    let mut checked: BTreeSet<(String, String)> = BTreeSet::new();
    let mut valid: Vec<(&IgnoreRule, ModulePattern)> = Vec::new();

    for rule in &model.ignore_rules {
        if !checked.insert((rule.section.clone(), rule.pattern.clone())) {
            continue;
        }
        match parse_for(&rule.tool, &rule.pattern) {
            Ok(pattern) => valid.push((rule, pattern)),
            Err(e) => violations.push(Violation::new(
                ViolationKind::InvalidModulePattern,
                &rule.section,
                pattern_field(&rule.tool),
                e.to_string(),
            )),
        }
    }

    for rule in &model.overrides {
        let section = rule.section();
        for module in &rule.modules {
            if !checked.insert((section.clone(), module.clone())) {
                continue;
            }
            if let Err(e) = parse_for(&rule.tool, module) {
                violations.push(Violation::new(
                    ViolationKind::InvalidModulePattern,
                    &section,
                    pattern_field(&rule.tool),
                    e.to_string(),
                ));
            }
        }
    }

    check_duplicates(&model.ignore_rules, &mut violations);
    check_first_party(model, &valid, &mut violations);

    tracing::debug!(
        rules = model.ignore_rules.len(),
        violations = violations.len(),
        "ignore rules checked"
    );
    violations
}

/// One violation per pattern repeated within a tool, however many times.
fn check_duplicates(rules: &[IgnoreRule], violations: &mut Vec<Violation>) {
    let mut occurrences: BTreeMap<(&ToolKind, &str), Vec<&IgnoreRule>> = BTreeMap::new();
    for rule in rules {
        occurrences
            .entry((&rule.tool, rule.pattern.as_str()))
            .or_default()
            .push(rule);
    }

    for ((tool, pattern), rules) in occurrences {
        if rules.len() < 2 {
            continue;
        }
        let sections: Vec<&str> = rules.iter().map(|r| r.section.as_str()).collect();
        violations.push(Violation::new(
            ViolationKind::DuplicatePattern,
            &rules[1].section,
            pattern_field(tool),
            format!(
                "{tool} ignores '{pattern}' {} times ({})",
                rules.len(),
                sections.join(", ")
            ),
        ));
    }
}

/// Suppressions covering packages isort treats as first party hide
/// problems in the project's own code.
fn check_first_party(
    model: &ConfigModel,
    rules: &[(&IgnoreRule, ModulePattern)],
    violations: &mut Vec<Violation>,
) {
    let first_party = model
        .tool(&ToolKind::Isort)
        .map(|isort| isort.string_list("known_first_party"))
        .unwrap_or_default();
    if first_party.is_empty() {
        return;
    }

    for (rule, pattern) in rules {
        for package in first_party.iter().filter(|p| pattern.matches(p)) {
            violations.push(Violation::new(
                ViolationKind::IgnoresFirstParty,
                &rule.section,
                pattern_field(&rule.tool),
                format!(
                    "'{}' suppresses {} diagnostics for first-party package '{package}'",
                    pattern, rule.tool
                ),
            ));
        }
    }
}
