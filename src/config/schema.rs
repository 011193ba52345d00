//! Configuration schema types
//!
//! This module defines the configuration structure for Tally. Every section
//! validates itself and reports the first problem as a plain message.

use serde::{Deserialize, Serialize};

/// Main Tally configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Report generation settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Patient source settings
    pub source: SourceConfig,

    /// Registry metadata written to the document header
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TallyConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.report.validate()?;
        self.source.validate()?;
        self.registry.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Report generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rule set to report (e.g. `cqm_2011`)
    #[serde(default = "default_rule_set")]
    pub rule_set: String,

    /// Collation mode: `outer` (flat) or `inner` (grouped by plan)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Target date (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`); today when unset
    #[serde(default)]
    pub target_date: Option<String>,

    /// Patients evaluated per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Provider/patient relationship: `primary` or `encounter`
    #[serde(default = "default_provider_relationship")]
    pub provider_relationship: String,

    /// Restrict the report to these provider ids (empty = all)
    #[serde(default)]
    pub providers: Vec<String>,

    /// Begin date of AMC reporting (`YYYY-MM-DD`)
    #[serde(default)]
    pub amc_begin_date: Option<String>,

    /// TOML file extending the built-in rule catalog
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl ReportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.rule_set.trim().is_empty() {
            return Err("report.rule_set cannot be empty".to_string());
        }

        let valid_modes = ["outer", "inner"];
        if !valid_modes.contains(&self.mode.as_str()) {
            return Err(format!(
                "Invalid report.mode '{}'. Must be one of: {}",
                self.mode,
                valid_modes.join(", ")
            ));
        }

        if self.batch_size == 0 || self.batch_size > 10000 {
            return Err(format!(
                "report.batch_size must be between 1 and 10000, got {}",
                self.batch_size
            ));
        }

        let valid_relationships = ["primary", "encounter"];
        if !valid_relationships.contains(&self.provider_relationship.as_str()) {
            return Err(format!(
                "Invalid report.provider_relationship '{}'. Must be one of: {}",
                self.provider_relationship,
                valid_relationships.join(", ")
            ));
        }

        if self.providers.iter().any(|p| p.trim().is_empty()) {
            return Err("report.providers cannot contain empty ids".to_string());
        }

        if let Some(date) = &self.target_date {
            crate::core::report::parse_target_date(date)
                .map_err(|e| format!("Invalid report.target_date: {e}"))?;
        }

        if let Some(date) = &self.amc_begin_date {
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                format!("Invalid report.amc_begin_date '{date}': {e}. Expected YYYY-MM-DD")
            })?;
        }

        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            rule_set: default_rule_set(),
            mode: default_mode(),
            target_date: None,
            batch_size: default_batch_size(),
            provider_relationship: default_provider_relationship(),
            providers: Vec::new(),
            amc_begin_date: None,
            catalog_path: None,
        }
    }
}

/// Patient source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Adapter kind: `snapshot` or `jsonl`
    #[serde(default = "default_source_kind")]
    pub kind: String,

    /// Snapshot file, or the patients JSON Lines file
    pub path: String,

    /// Providers JSON file (required for `jsonl`)
    #[serde(default)]
    pub providers_path: Option<String>,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_kinds = ["snapshot", "jsonl"];
        if !valid_kinds.contains(&self.kind.as_str()) {
            return Err(format!(
                "Invalid source.kind '{}'. Must be one of: {}",
                self.kind,
                valid_kinds.join(", ")
            ));
        }

        if self.path.trim().is_empty() {
            return Err("source.path cannot be empty".to_string());
        }

        if self.kind == "jsonl" && self.providers_path.is_none() {
            return Err("source.providers_path is required when source.kind = 'jsonl'".to_string());
        }

        Ok(())
    }
}

/// Registry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_name")]
    pub name: String,

    #[serde(default = "default_registry_id")]
    pub id: String,

    /// Value of `create-by` in the file audit data
    #[serde(default = "default_created_by")]
    pub created_by: String,

    #[serde(default = "default_registry_version")]
    pub version: String,
}

impl RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("registry.name cannot be empty".to_string());
        }
        if self.id.trim().is_empty() {
            return Err("registry.id cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
            id: default_registry_id(),
            created_by: default_created_by(),
            version: default_registry_version(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Document path; stdout when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Write a `<path>.sha256` file next to the document
    #[serde(default)]
    pub write_checksum: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.write_checksum && self.path.is_none() {
            return Err("output.write_checksum requires output.path".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_rule_set() -> String {
    "cqm_2011".to_string()
}

fn default_mode() -> String {
    "outer".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_provider_relationship() -> String {
    "primary".to_string()
}

fn default_source_kind() -> String {
    "snapshot".to_string()
}

fn default_registry_name() -> String {
    "Model Registry".to_string()
}

fn default_registry_id() -> String {
    "125789123".to_string()
}

fn default_created_by() -> String {
    "RegistryA".to_string()
}

fn default_registry_version() -> String {
    "1.0".to_string()
}

fn default_local_path() -> String {
    "/var/log/tally".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
