//! Generate command implementation
//!
//! This module implements the `generate` command, which evaluates a rule set
//! and writes the PQRI registry document.
//!
//! The document goes to stdout unless an output path is configured, so every
//! human-readable message is written to stderr.

use super::load_catalog;
use crate::adapters::source::create_patient_source;
use crate::config::load_config;
use crate::core::report::{generate_report, parse_target_date, ReportRequest};
use crate::core::verification::write_checksum_file;
use clap::Args;
use std::io::Write;
use std::path::Path;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Override the rule set to report
    #[arg(long)]
    pub rule_set: Option<String>,

    /// Override the collation mode (outer or inner)
    #[arg(long)]
    pub mode: Option<String>,

    /// Override the target date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub target_date: Option<String>,

    /// Override provider id(s) to report (comma-separated)
    #[arg(long)]
    pub provider: Option<String>,

    /// Write the document to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Fix the document creation timestamp (defaults to now)
    #[arg(long)]
    pub created_at: Option<String>,
}

impl GenerateArgs {
    /// Execute the generate command
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting generate command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(rule_set) = &self.rule_set {
            tracing::info!(rule_set = %rule_set, "Overriding rule set from CLI");
            config.report.rule_set = rule_set.clone();
        }

        if let Some(mode) = &self.mode {
            tracing::info!(mode = %mode, "Overriding collation mode from CLI");
            config.report.mode = mode.clone();
        }

        if let Some(target_date) = &self.target_date {
            tracing::info!(target_date = %target_date, "Overriding target date from CLI");
            config.report.target_date = Some(target_date.clone());
        }

        if let Some(providers) = &self.provider {
            let ids: Vec<String> = providers
                .split(',')
                .map(|s| s.trim().to_string())
                .collect();
            tracing::info!(providers = ?ids, "Overriding providers from CLI");
            config.report.providers = ids;
        }

        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let created_at = match &self.created_at {
            Some(value) => match parse_target_date(value) {
                Ok(at) => at,
                Err(e) => {
                    eprintln!("Invalid --created-at: {e}");
                    return Ok(2);
                }
            },
            None => chrono::Local::now().naive_local(),
        };

        let request = match ReportRequest::from_config(&config, created_at) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Invalid report settings: {e}");
                return Ok(2);
            }
        };

        let catalog = match load_catalog(&config.report) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load rule catalog");
                eprintln!("Failed to load rule catalog: {e}");
                return Ok(2);
            }
        };

        let source = match create_patient_source(&config.source) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open patient source");
                eprintln!("Failed to open patient source: {e}");
                return Ok(5);
            }
        };

        let outcome = match generate_report(&request, &catalog, source.as_ref()) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Report generation failed");
                eprintln!("Report generation failed: {e}");
                return Ok(5);
            }
        };

        match &config.output.path {
            Some(path) => {
                let path = Path::new(path);
                std::fs::write(path, outcome.document.as_bytes())?;
                tracing::info!(path = %path.display(), bytes = outcome.document.len(), "Report written");

                if config.output.write_checksum {
                    let checksum_file = write_checksum_file(path, outcome.document.checksum())?;
                    tracing::info!(path = %checksum_file.display(), "Checksum written");
                }
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(outcome.document.as_bytes())?;
                stdout.flush()?;
            }
        }

        let summary = &outcome.summary;
        summary.log_summary();

        eprintln!();
        eprintln!("📊 Report Summary:");
        eprintln!("  Rule Set: {}", summary.rule_set);
        eprintln!("  Mode: {}", summary.mode);
        eprintln!("  Target Date: {}", summary.target_date);
        eprintln!("  Providers: {}", summary.providers);
        eprintln!("  Measures Written: {}", summary.measures_written);
        eprintln!("  Patients Evaluated: {}", summary.patients_evaluated);
        eprintln!("  Checksum: {}", summary.checksum);
        eprintln!("  Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);

        let exit_code = if summary.is_complete() {
            eprintln!("✅ Report generated successfully!");
            0
        } else {
            eprintln!("⚠️  Report generated with skipped rules:");
            for skipped in &summary.skipped_rules {
                eprintln!("  - {}: {}", skipped.rule_id, skipped.reason);
            }
            1
        };

        Ok(exit_code)
    }
}
