//! Core report pipeline for Tally.
//!
//! # Modules
//!
//! - [`catalog`] - Rule definitions and rule sets
//! - [`collate`] - Plan/provider scoping and patient batching
//! - [`evaluate`] - CQM and AMC rule evaluation
//! - [`aggregate`] - Turns collated batches into result rows
//! - [`emit`] - PQRI registry XML emission
//! - [`report`] - Report orchestration and summary
//! - [`verification`] - Document checksums
//!
//! # Report Workflow
//!
//! 1. **Resolve**: Look up the rule set (and its plans) in the catalog
//! 2. **Collate**: Walk plans and providers, batching each provider's patients
//! 3. **Evaluate**: Run every rule of the scope over each batch
//! 4. **Aggregate**: Merge batch tallies into measure rows per provider
//! 5. **Emit**: Write the rows into the registry document
//! 6. **Report**: Produce a summary with the document checksum
//!
//! # Example
//!
//! ```rust,no_run
//! use tally::adapters::source::SnapshotSource;
//! use tally::core::catalog::RuleCatalog;
//! use tally::core::report::{generate_report, ReportRequest};
//! use tally::domain::RuleSetId;
//! use chrono::NaiveDate;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = RuleCatalog::builtin();
//! let source = SnapshotSource::from_path("patients.json")?;
//! let target = NaiveDate::from_ymd_opt(2016, 6, 1)
//!     .and_then(|d| d.and_hms_opt(0, 0, 0))
//!     .ok_or("bad date")?;
//!
//! let request = ReportRequest::new(RuleSetId::new("cqm_2011")?, target, target);
//! let outcome = generate_report(&request, &catalog, &source)?;
//!
//! println!("{}", outcome.document.as_str());
//! println!("Measures: {}", outcome.summary.measures_written);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod collate;
pub mod emit;
pub mod evaluate;
pub mod report;
pub mod verification;
