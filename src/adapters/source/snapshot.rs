//! In-memory snapshot source
//!
//! A single JSON document holding every provider and patient:
//!
//! ```json
//! { "providers": [ { "id": "1", "npi": "1234567893" } ],
//!   "patients": [ { "pid": "1", "provider_id": "1", "date_of_birth": "1950-01-01" } ] }
//! ```

use super::traits::{PatientCriteria, PatientIter, PatientSource};
use crate::domain::{PatientRecord, Provider, Result, SourceError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    providers: Vec<Provider>,

    #[serde(default)]
    patients: Vec<PatientRecord>,
}

/// Frozen snapshot of providers and patients held in memory
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    providers: Vec<Provider>,
    patients: Vec<PatientRecord>,
}

impl SnapshotSource {
    pub fn new(providers: Vec<Provider>, patients: Vec<PatientRecord>) -> Self {
        Self {
            providers,
            patients,
        }
    }

    /// Parses a snapshot document
    pub fn from_json(content: &str, location: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(content).map_err(|e| SourceError::InvalidRecord {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::new(snapshot.providers, snapshot.patients))
    }

    /// Loads a snapshot file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let source = Self::from_json(&content, &path.display().to_string())?;

        tracing::debug!(
            path = %path.display(),
            providers = source.providers.len(),
            patients = source.patients.len(),
            "Loaded patient snapshot"
        );
        Ok(source)
    }
}

impl PatientSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn providers(&self) -> Result<Vec<Provider>> {
        Ok(self.providers.clone())
    }

    fn query_patients(&self, criteria: &PatientCriteria) -> Result<PatientIter<'_>> {
        let criteria = criteria.clone();
        Ok(Box::new(
            self.patients
                .iter()
                .filter(move |p| criteria.accepts(p))
                .cloned()
                .map(Ok),
        ))
    }
}
