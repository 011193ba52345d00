//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod generate;
pub mod init;
pub mod rules;
pub mod validate;

use crate::config::ReportConfig;
use crate::core::catalog::RuleCatalog;
use crate::domain::Result;

/// Built-in catalog, extended with `report.catalog_path` when set
pub(crate) fn load_catalog(report: &ReportConfig) -> Result<RuleCatalog> {
    let mut catalog = RuleCatalog::builtin();
    if let Some(path) = &report.catalog_path {
        tracing::info!(catalog_path = %path, "Extending rule catalog");
        catalog.extend_from_file(path)?;
    }
    Ok(catalog)
}
