//! Rules command implementation
//!
//! Lists the rule sets in the catalog, or the plans and rules of one set.

use super::load_catalog;
use crate::config::{load_config, ReportConfig};
use crate::core::catalog::RuleCatalog;
use crate::domain::{RuleSet, RuleSetId};
use clap::Args;
use std::path::Path;

/// Arguments for the rules command
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Show the plans and rules of this rule set
    #[arg(long)]
    pub rule_set: Option<String>,
}

impl RulesArgs {
    /// Execute the rules command
    ///
    /// The configuration file is optional here; without it only the
    /// built-in catalog is listed.
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let report = if Path::new(config_path).exists() {
            match load_config(config_path) {
                Ok(config) => config.report,
                Err(e) => {
                    println!("❌ Failed to load configuration: {e}");
                    return Ok(2);
                }
            }
        } else {
            ReportConfig::default()
        };

        let catalog = match load_catalog(&report) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Rule catalog could not be loaded: {e}");
                return Ok(2);
            }
        };

        match &self.rule_set {
            Some(id) => {
                let set = RuleSetId::new(id.as_str())
                    .map_err(anyhow::Error::msg)
                    .and_then(|id| catalog.rule_set(&id).map_err(anyhow::Error::from));
                match set {
                    Ok(set) => {
                        print_rule_set(&catalog, set);
                        Ok(0)
                    }
                    Err(e) => {
                        println!("❌ {e}");
                        Ok(2)
                    }
                }
            }
            None => {
                println!("Rule sets ({} rules in catalog):", catalog.rule_count());
                for set in catalog.rule_sets() {
                    println!(
                        "  {:<12} {} ({} rules, {} plans)",
                        set.id,
                        set.title,
                        set.rules.len(),
                        set.plans.len()
                    );
                }
                Ok(0)
            }
        }
    }
}

fn print_rule_set(catalog: &RuleCatalog, set: &RuleSet) {
    println!("{} - {}", set.id, set.title);
    println!();

    for rule_id in &set.rules {
        match catalog.lookup(rule_id) {
            Ok(rule) => println!(
                "  {:<28} {:<8} {:<8} {}",
                rule.id,
                rule.category,
                rule.codes.measure_number(),
                rule.title
            ),
            Err(_) => println!("  {rule_id:<28} (not in catalog)"),
        }
    }

    if !set.plans.is_empty() {
        println!();
        println!("Plans:");
        for plan in &set.plans {
            println!(
                "  {:<20} group {}  {} ({} rules)",
                plan.id,
                plan.measure_group,
                plan.title,
                plan.rules.len()
            );
        }
    }
}
