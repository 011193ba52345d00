//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tally.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Tally configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point [source] at a patient snapshot or JSON Lines export");
                println!("  3. Validate configuration: tally validate-config");
                println!("  4. List rule sets: tally rules");
                println!("  5. Generate a report: tally generate --output registry.xml");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Tally Configuration File
# Clinical Quality Measure Registry Reporting

[application]
log_level = "info"

[report]
rule_set = "cqm_2011"
mode = "outer"
batch_size = 100
provider_relationship = "primary"

[source]
kind = "snapshot"
path = "patients.json"

[registry]
name = "Model Registry"
id = "125789123"
created_by = "RegistryA"
version = "1.0"

[output]
path = "registry.xml"
write_checksum = true

[logging]
local_enabled = false
local_path = "/var/log/tally"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Tally Configuration File
# Clinical Quality Measure Registry Reporting
#
# This file contains all configuration options with examples and explanations.
# Any value may reference an environment variable as ${VAR}, and any key may
# be overridden with TALLY_<SECTION>_<KEY> (e.g. TALLY_REPORT_MODE=inner).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Report Settings
# ============================================================================
[report]
# Rule set to report: cqm_2011 | amc_2011 (see `tally rules`)
rule_set = "cqm_2011"

# Collation mode
# - outer: one flat measure group "X" holding every provider
# - inner: one measure group per plan of the rule set
mode = "outer"

# Target date, the end of the measurement period (default: now)
# target_date = "2016-12-31"

# Patients evaluated per batch (1-10000)
batch_size = 100

# Which patients belong to a provider
# - primary: the patient's primary care provider
# - encounter: any provider who rendered an encounter for the patient
provider_relationship = "primary"

# Provider ids to report (empty = all)
providers = []

# AMC reporting begin date (default: twelve months before the target date)
# amc_begin_date = "2016-01-01"

# Additional rules and rule sets in TOML
# catalog_path = "rules.toml"

# ============================================================================
# Patient Source
# ============================================================================
[source]
# snapshot: one JSON document with "providers" and "patients"
# jsonl: providers JSON array plus one patient record per line
kind = "snapshot"
path = "patients.json"
# providers_path = "providers.json"

# ============================================================================
# Registry Metadata
# ============================================================================
[registry]
name = "Model Registry"
id = "125789123"
created_by = "RegistryA"
version = "1.0"

# ============================================================================
# Output
# ============================================================================
[output]
# Document path (omit to write to stdout)
path = "registry.xml"

# Write registry.xml.sha256 next to the document
write_checksum = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "/var/log/tally"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "tally.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "tally.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            assert_eq!(config.report.rule_set, "cqm_2011");
            assert_eq!(config.source.path, "patients.json");
        }
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tally.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[report]"));
    }
}
