//! JSON Lines source
//!
//! Providers come from a JSON array file; patients are streamed from a JSON
//! Lines file (one patient record per line) on every query, so only one
//! record is held at a time.

use super::traits::{PatientCriteria, PatientIter, PatientSource};
use crate::domain::{PatientRecord, Provider, Result, SourceError, TallyError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Streaming file source
#[derive(Debug, Clone)]
pub struct JsonlSource {
    providers: Vec<Provider>,
    patients_path: PathBuf,
}

impl JsonlSource {
    /// Opens a source, reading the provider list eagerly
    pub fn open(providers_path: impl AsRef<Path>, patients_path: impl Into<PathBuf>) -> Result<Self> {
        let providers_path = providers_path.as_ref();
        let content =
            std::fs::read_to_string(providers_path).map_err(|e| SourceError::ReadFailed {
                path: providers_path.display().to_string(),
                message: e.to_string(),
            })?;
        let providers: Vec<Provider> =
            serde_json::from_str(&content).map_err(|e| SourceError::InvalidRecord {
                location: providers_path.display().to_string(),
                message: e.to_string(),
            })?;

        let patients_path = patients_path.into();
        if !patients_path.is_file() {
            return Err(SourceError::ReadFailed {
                path: patients_path.display().to_string(),
                message: "file does not exist".to_string(),
            }
            .into());
        }

        tracing::debug!(
            providers = providers.len(),
            patients_path = %patients_path.display(),
            "Opened JSON Lines patient source"
        );

        Ok(Self {
            providers,
            patients_path,
        })
    }
}

fn parse_line(path: &Path, number: usize, line: std::io::Result<String>) -> Option<Result<PatientRecord>> {
    let location = format!("{}:{}", path.display(), number + 1);
    let line = match line {
        Ok(line) => line,
        Err(e) => {
            return Some(Err(TallyError::from(SourceError::ReadFailed {
                path: location,
                message: e.to_string(),
            })))
        }
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(&line).map_err(|e| {
            TallyError::from(SourceError::InvalidRecord {
                location,
                message: e.to_string(),
            })
        }),
    )
}

impl PatientSource for JsonlSource {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn providers(&self) -> Result<Vec<Provider>> {
        Ok(self.providers.clone())
    }

    fn query_patients(&self, criteria: &PatientCriteria) -> Result<PatientIter<'_>> {
        let file = File::open(&self.patients_path).map_err(|e| SourceError::ReadFailed {
            path: self.patients_path.display().to_string(),
            message: e.to_string(),
        })?;
        let criteria = criteria.clone();
        let path = self.patients_path.as_path();

        Ok(Box::new(
            BufReader::new(file)
                .lines()
                .enumerate()
                .filter_map(move |(number, line)| parse_line(path, number, line))
                .filter(move |record| match record {
                    Ok(patient) => criteria.accepts(patient),
                    Err(_) => true,
                }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::source::ProviderRelationship;
    use crate::domain::ProviderId;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_jsonl_streams_matching_patients() {
        let dir = TempDir::new().unwrap();
        let providers = write(&dir, "providers.json", r#"[{"id": "1"}, {"id": "2"}]"#);
        let patients = write(
            &dir,
            "patients.jsonl",
            "{\"pid\": \"10\", \"provider_id\": \"1\", \"date_of_birth\": \"1950-01-01\"}\n\n\
             {\"pid\": \"11\", \"provider_id\": \"2\", \"date_of_birth\": \"1950-01-01\"}\n\
             {\"pid\": \"12\", \"provider_id\": \"1\", \"date_of_birth\": \"1950-01-01\"}\n",
        );

        let source = JsonlSource::open(&providers, patients).unwrap();
        assert_eq!(source.providers().unwrap().len(), 2);

        let criteria =
            PatientCriteria::new(ProviderId::new("1").unwrap(), ProviderRelationship::Primary);
        let pids: Vec<String> = source
            .query_patients(&criteria)
            .unwrap()
            .map(|p| p.unwrap().pid.into_inner())
            .collect();
        assert_eq!(pids, vec!["10", "12"]);
    }

    #[test]
    fn test_jsonl_reports_bad_line() {
        let dir = TempDir::new().unwrap();
        let providers = write(&dir, "providers.json", r#"[{"id": "1"}]"#);
        let patients = write(&dir, "patients.jsonl", "{\"pid\": \"10\"\n");

        let source = JsonlSource::open(&providers, patients).unwrap();
        let criteria =
            PatientCriteria::new(ProviderId::new("1").unwrap(), ProviderRelationship::Primary);
        let first = source.query_patients(&criteria).unwrap().next().unwrap();
        match first {
            Err(TallyError::Source(SourceError::InvalidRecord { location, .. })) => {
                assert!(location.ends_with("patients.jsonl:1"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_jsonl_missing_patients_file() {
        let dir = TempDir::new().unwrap();
        let providers = write(&dir, "providers.json", "[]");
        let err = JsonlSource::open(&providers, dir.path().join("missing.jsonl")).unwrap_err();
        assert!(matches!(err, TallyError::Source(SourceError::ReadFailed { .. })));
    }
}
