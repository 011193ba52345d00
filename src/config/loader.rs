//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::TallyConfig;
use crate::domain::errors::TallyError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TallyConfig
/// 4. Applies environment variable overrides (TALLY_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use tally::config::loader::load_config;
///
/// let config = load_config("tally.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TallyConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TallyError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TallyError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
pub fn parse_config(contents: &str) -> Result<TallyConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: TallyConfig = toml::from_str(&contents)
        .map_err(|e| TallyError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        TallyError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| TallyError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(TallyError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using TALLY_* prefix
///
/// Environment variables follow the pattern: TALLY_<SECTION>_<KEY>
/// For example: TALLY_REPORT_MODE, TALLY_SOURCE_PATH
fn apply_env_overrides(config: &mut TallyConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("TALLY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Report overrides
    if let Ok(val) = std::env::var("TALLY_REPORT_RULE_SET") {
        config.report.rule_set = val;
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_MODE") {
        config.report.mode = val;
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_TARGET_DATE") {
        config.report.target_date = Some(val);
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.report.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_PROVIDER_RELATIONSHIP") {
        config.report.provider_relationship = val;
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_PROVIDERS") {
        config.report.providers = val
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_AMC_BEGIN_DATE") {
        config.report.amc_begin_date = Some(val);
    }
    if let Ok(val) = std::env::var("TALLY_REPORT_CATALOG_PATH") {
        config.report.catalog_path = Some(val);
    }

    // Source overrides
    if let Ok(val) = std::env::var("TALLY_SOURCE_KIND") {
        config.source.kind = val;
    }
    if let Ok(val) = std::env::var("TALLY_SOURCE_PATH") {
        config.source.path = val;
    }
    if let Ok(val) = std::env::var("TALLY_SOURCE_PROVIDERS_PATH") {
        config.source.providers_path = Some(val);
    }

    // Registry overrides
    if let Ok(val) = std::env::var("TALLY_REGISTRY_NAME") {
        config.registry.name = val;
    }
    if let Ok(val) = std::env::var("TALLY_REGISTRY_ID") {
        config.registry.id = val;
    }
    if let Ok(val) = std::env::var("TALLY_REGISTRY_CREATED_BY") {
        config.registry.created_by = val;
    }

    // Output overrides
    if let Ok(val) = std::env::var("TALLY_OUTPUT_PATH") {
        config.output.path = Some(val);
    }
    if let Ok(val) = std::env::var("TALLY_OUTPUT_WRITE_CHECKSUM") {
        config.output.write_checksum = val.parse().unwrap_or(false);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("TALLY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("TALLY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("TALLY_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("TALLY_LOADER_TEST_VAR", "test_value");
        let input = "path = \"${TALLY_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "path = \"test_value\"\n");
        std::env::remove_var("TALLY_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("TALLY_LOADER_MISSING_VAR");
        let input = "path = \"${TALLY_LOADER_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("TALLY_LOADER_COMMENTED_VAR");
        let input = "# path = \"${TALLY_LOADER_COMMENTED_VAR}\"\nmode = \"outer\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${TALLY_LOADER_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[report]
rule_set = "cqm_2011"
mode = "inner"
batch_size = 50

[source]
kind = "snapshot"
path = "patients.json"

[registry]
name = "Test Registry"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.report.mode, "inner");
        assert_eq!(config.report.batch_size, 50);
        assert_eq!(config.registry.name, "Test Registry");
        assert_eq!(config.registry.id, "125789123");
    }

    #[test]
    fn test_parse_config_validation_error() {
        let result = parse_config(
            r#"
[report]
mode = "sideways"

[source]
path = "patients.json"
"#,
        );
        match result {
            Err(TallyError::Configuration(message)) => {
                assert!(message.contains("report.mode"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
