//! Configuration management for Tally.
//!
//! # Overview
//!
//! Tally uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TALLY_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tally::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tally.toml")?;
//!
//! println!("Rule set: {}", config.report.rule_set);
//! println!("Mode: {}", config.report.mode);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ReportConfig`] - Rule set, collation mode, batching and provider selection
//! - [`SourceConfig`] - Patient source adapter and its files
//! - [`RegistryConfig`] - Registry metadata written to the document
//! - [`OutputConfig`] - Output path and checksum sidecar
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [report]
//! rule_set = "cqm_2011"
//! mode = "inner"
//! target_date = "2016-06-01"
//!
//! [source]
//! kind = "jsonl"
//! path = "${TALLY_DATA_DIR}/patients.jsonl"
//! providers_path = "${TALLY_DATA_DIR}/providers.json"
//!
//! [output]
//! path = "registry.xml"
//! write_checksum = true
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, LoggingConfig, OutputConfig, RegistryConfig, ReportConfig, SourceConfig,
    TallyConfig,
};
