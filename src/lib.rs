// Tally - Clinical Quality Measure Registry Reporting
// Copyright (c) 2025 Tally Contributors
// Licensed under the MIT License

//! # Tally - Clinical Quality Measure Registry Reporting
//!
//! Tally evaluates clinical quality measures (CQM) and automated measure
//! calculations (AMC) over a patient population and writes the results as a
//! PQRI registry XML submission.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Cataloging** measure rules and the rule sets (and plans) they report in
//! - **Collating** patients per provider into bounded batches
//! - **Evaluating** rules into population, denominator, exclusion and numerator counts
//! - **Emitting** a deterministic registry document with a SHA-256 checksum
//!
//! ## Architecture
//!
//! Tally follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Report pipeline (catalog, collate, evaluate, aggregate, emit)
//! - [`adapters`] - Patient sources (JSON snapshot, JSON Lines)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tally::adapters::source::create_patient_source;
//! use tally::config::load_config;
//! use tally::core::catalog::RuleCatalog;
//! use tally::core::report::{generate_report, ReportRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("tally.toml")?;
//!     let source = create_patient_source(&config.source)?;
//!     let catalog = RuleCatalog::builtin();
//!
//!     let created_at = chrono::Local::now().naive_local();
//!     let request = ReportRequest::from_config(&config, created_at)?;
//!     let outcome = generate_report(&request, &catalog, source.as_ref())?;
//!
//!     std::fs::write("registry.xml", outcome.document.as_bytes())?;
//!     println!("Wrote {} measures", outcome.summary.measures_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Collation Modes
//!
//! - **Outer**: a single measure group `X` holding every provider
//! - **Inner**: one measure group per plan, providers repeated inside each
//!
//! ## Error Handling
//!
//! Tally uses the [`domain::TallyError`] type for all errors. A rule that
//! cannot be evaluated is skipped and reported in the summary rather than
//! failing the whole report:
//!
//! ```rust,no_run
//! use tally::core::catalog::RuleCatalog;
//! use tally::domain::{RuleId, TallyError};
//!
//! fn example() -> Result<(), TallyError> {
//!     let catalog = RuleCatalog::builtin();
//!     let rule = catalog.lookup(&RuleId::new("rule_dm_eye_cqm").map_err(TallyError::Validation)?)?;
//!     println!("{}", rule.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Tally uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(rule_set = "cqm_2011", "Generating report");
//! warn!(rule_id = "rule_influenza_ge_50", "Rule skipped");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
