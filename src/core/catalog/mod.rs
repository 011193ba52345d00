//! Rule catalog
//!
//! The catalog maps rule ids to their definitions and holds the reportable
//! rule sets. It is built once per process, optionally extended from a TOML
//! catalog file, and read-only afterwards.
//!
//! # Catalog files
//!
//! ```toml
//! [[rules]]
//! id = "rule_custom_cqm"
//! category = "cqm"
//! title = "Custom measure"
//! codes = { nqf = "9999" }
//!
//! [[rules.populations]]
//! initial = { type = "age", min = 18 }
//!
//! [[rules.populations.numerators]]
//! criterion = { type = "encounters", min = 1 }
//!
//! [[rule_sets]]
//! id = "custom"
//! title = "Custom rules"
//! rules = ["rule_custom_cqm"]
//! ```

pub mod builtin;

use crate::domain::{Result, RuleCategory, RuleDefinition, RuleId, RuleSet, RuleSetId, TallyError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Contents of a catalog extension file
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    rules: Vec<RuleDefinition>,

    #[serde(default)]
    rule_sets: Vec<RuleSet>,
}

/// Registry of rule definitions and rule sets
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: HashMap<RuleId, RuleDefinition>,
    rule_sets: HashMap<RuleSetId, RuleSet>,
}

impl RuleCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `cqm_2011` and `amc_2011` rule sets and their rules
    pub fn builtin() -> Self {
        let cqm = builtin::cqm_rules();
        let amc = builtin::amc_rules();
        let sets = builtin::rule_sets(&cqm, &amc);

        let mut catalog = Self::new();
        for rule in cqm.into_iter().chain(amc).chain(builtin::standard_rules()) {
            catalog.insert_rule(rule);
        }
        for set in sets {
            catalog.insert_rule_set(set);
        }
        catalog
    }

    /// Registers a rule, replacing an existing rule with the same id
    pub fn insert_rule(&mut self, rule: RuleDefinition) -> Option<RuleDefinition> {
        self.rules.insert(rule.id.clone(), rule)
    }

    /// Registers a rule set, replacing an existing set with the same id
    pub fn insert_rule_set(&mut self, set: RuleSet) -> Option<RuleSet> {
        self.rule_sets.insert(set.id.clone(), set)
    }

    /// Definition of a rule
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::UnknownRule`] if the id is not registered.
    pub fn lookup(&self, rule_id: &RuleId) -> Result<&RuleDefinition> {
        self.rules
            .get(rule_id)
            .ok_or_else(|| TallyError::UnknownRule(rule_id.to_string()))
    }

    /// Category of a rule
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::UnknownRule`] if the id is not registered.
    pub fn rule_type(&self, rule_id: &RuleId) -> Result<RuleCategory> {
        self.lookup(rule_id).map(|rule| rule.category)
    }

    /// A rule set by id
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::UnknownRuleSet`] if the id is not registered.
    pub fn rule_set(&self, id: &RuleSetId) -> Result<&RuleSet> {
        self.rule_sets
            .get(id)
            .ok_or_else(|| TallyError::UnknownRuleSet(id.to_string()))
    }

    /// All rule sets, ordered by id
    pub fn rule_sets(&self) -> Vec<&RuleSet> {
        let mut sets: Vec<_> = self.rule_sets.values().collect();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        sets
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Adds the rules and rule sets of a TOML catalog document
    ///
    /// Entries replace built-in entries with the same id.
    pub fn extend_from_toml(&mut self, content: &str) -> Result<()> {
        let file: CatalogFile = toml::from_str(content)?;
        for set in &file.rule_sets {
            validate_rule_set(set)?;
        }

        let (rules, sets) = (file.rules.len(), file.rule_sets.len());
        for rule in file.rules {
            if self.insert_rule(rule).is_some() {
                tracing::debug!("Catalog rule replaced a built-in definition");
            }
        }
        for set in file.rule_sets {
            self.insert_rule_set(set);
        }

        tracing::debug!(rules, rule_sets = sets, "Extended rule catalog");
        Ok(())
    }

    /// Adds the rules and rule sets of a TOML catalog file
    pub fn extend_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TallyError::Configuration(format!(
                "Failed to read catalog file {}: {e}",
                path.display()
            ))
        })?;
        self.extend_from_toml(&content)
    }
}

fn validate_rule_set(set: &RuleSet) -> Result<()> {
    for plan in &set.plans {
        if plan.measure_group.trim().is_empty() {
            return Err(TallyError::Validation(format!(
                "Plan {} of rule set {} has no measure group",
                plan.id, set.id
            )));
        }
    }
    Ok(())
}
