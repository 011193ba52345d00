//! Patient source factory
//!
//! This module creates the patient source selected by configuration.

use super::jsonl::JsonlSource;
use super::snapshot::SnapshotSource;
use super::traits::PatientSource;
use crate::config::SourceConfig;
use crate::domain::{Result, TallyError};

/// Create a patient source based on the configuration
///
/// # Errors
///
/// Returns an error if the kind is unknown or the source files cannot be read
pub fn create_patient_source(config: &SourceConfig) -> Result<Box<dyn PatientSource>> {
    match config.kind.as_str() {
        "snapshot" => {
            tracing::info!(path = %config.path, "Creating snapshot patient source");
            Ok(Box::new(SnapshotSource::from_path(&config.path)?))
        }
        "jsonl" => {
            let providers_path = config.providers_path.as_deref().ok_or_else(|| {
                TallyError::Configuration(
                    "source.providers_path is required when source.kind = 'jsonl'".to_string(),
                )
            })?;
            tracing::info!(
                path = %config.path,
                providers_path,
                "Creating JSON Lines patient source"
            );
            Ok(Box::new(JsonlSource::open(providers_path, &config.path)?))
        }
        other => Err(TallyError::Configuration(format!(
            "Unknown source kind '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_create_snapshot_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"providers": [{"id": "1"}], "patients": []}"#)
            .unwrap();
        file.flush().unwrap();

        let config = SourceConfig {
            kind: "snapshot".to_string(),
            path: file.path().display().to_string(),
            providers_path: None,
        };
        let source = create_patient_source(&config).unwrap();
        assert_eq!(source.name(), "snapshot");
        assert_eq!(source.providers().unwrap().len(), 1);
    }

    #[test]
    fn test_create_jsonl_requires_providers_path() {
        let config = SourceConfig {
            kind: "jsonl".to_string(),
            path: "patients.jsonl".to_string(),
            providers_path: None,
        };
        assert!(matches!(
            create_patient_source(&config),
            Err(TallyError::Configuration(_))
        ));
    }

    #[test]
    fn test_create_unknown_kind() {
        let config = SourceConfig {
            kind: "ldap".to_string(),
            path: "x".to_string(),
            providers_path: None,
        };
        assert!(create_patient_source(&config).is_err());
    }
}
