//! Integration tests for logging functionality

use tally::config::LoggingConfig;
use tally::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "/var/log/tally");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_logging_invalid_level() {
    let result = init_logging("verbose", &LoggingConfig::default());
    assert!(result.is_err());
}

#[test]
fn test_logging_invalid_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let config = LoggingConfig {
        local_enabled: true,
        local_path: temp_dir.path().to_string_lossy().to_string(),
        local_rotation: "weekly".to_string(),
    };
    assert!(init_logging("info", &config).is_err());
}

// Only one subscriber can be installed per process; this is the only test
// in this binary that installs one.
#[test]
fn test_logging_directory_creation() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    assert!(!log_path.exists());
    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.exists());

    // Events outside the tally target are filtered out
    tracing::info!("Not written");
    drop(guard);

    let log_file = log_path.join(tally::logging::structured::LOG_FILE_NAME);
    let content = std::fs::read_to_string(log_file).unwrap();
    assert!(content.contains("Logging initialized"));
    assert!(!content.contains("Not written"));
}
