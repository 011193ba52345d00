//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Tally configuration file.

use super::load_catalog;
use crate::config::load_config;
use crate::domain::RuleSetId;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let catalog = match load_catalog(&config.report) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Rule catalog could not be loaded");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let rule_set = match RuleSetId::new(config.report.rule_set.as_str())
            .map_err(|e| e.to_string())
            .and_then(|id| catalog.rule_set(&id).map_err(|e| e.to_string()))
        {
            Ok(set) => set,
            Err(e) => {
                println!("❌ Rule set is not available");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Rule Set: {} ({} rules, {} plans)",
            rule_set.id,
            rule_set.rules.len(),
            rule_set.plans.len()
        );
        println!("  Mode: {}", config.report.mode);
        println!(
            "  Target Date: {}",
            config.report.target_date.as_deref().unwrap_or("now")
        );
        println!("  Batch Size: {}", config.report.batch_size);
        println!(
            "  Provider Relationship: {}",
            config.report.provider_relationship
        );
        println!(
            "  Providers: {}",
            if config.report.providers.is_empty() {
                "All".to_string()
            } else {
                format!("{:?}", config.report.providers)
            }
        );
        println!("  Source: {} ({})", config.source.path, config.source.kind);
        println!("  Registry: {} ({})", config.registry.name, config.registry.id);
        println!(
            "  Output: {}",
            config.output.path.as_deref().unwrap_or("stdout")
        );
        println!();
        Ok(0)
    }
}
