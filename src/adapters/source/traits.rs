//! Patient source abstraction
//!
//! This module defines the trait that patient data adapters must implement
//! to feed the collator.

use crate::domain::{PatientRecord, Provider, ProviderId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lazy stream of patient records
pub type PatientIter<'a> = Box<dyn Iterator<Item = Result<PatientRecord>> + 'a>;

/// How patients are attributed to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRelationship {
    /// The provider is the patient's primary care provider
    #[default]
    Primary,
    /// The patient had at least one encounter rendered by the provider
    Encounter,
}

impl ProviderRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderRelationship::Primary => "primary",
            ProviderRelationship::Encounter => "encounter",
        }
    }
}

impl fmt::Display for ProviderRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderRelationship {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "encounter" => Ok(Self::Encounter),
            _ => Err(format!(
                "Invalid provider relationship: {s}. Expected 'primary' or 'encounter'"
            )),
        }
    }
}

/// Patient query criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientCriteria {
    pub provider: ProviderId,
    pub relationship: ProviderRelationship,
}

impl PatientCriteria {
    pub fn new(provider: ProviderId, relationship: ProviderRelationship) -> Self {
        Self {
            provider,
            relationship,
        }
    }

    /// Whether a patient belongs to the queried provider
    pub fn accepts(&self, patient: &PatientRecord) -> bool {
        match self.relationship {
            ProviderRelationship::Primary => patient.provider_id.as_ref() == Some(&self.provider),
            ProviderRelationship::Encounter => patient.seen_by(&self.provider),
        }
    }
}

/// Source of providers and patient records
///
/// Implementations must return patients in a stable order so that repeated
/// reports over the same data are identical.
pub trait PatientSource: Send + Sync {
    /// Short name of the adapter, used in logs
    fn name(&self) -> &'static str;

    /// All providers, in source order
    ///
    /// # Errors
    ///
    /// Returns an error if the provider list cannot be read.
    fn providers(&self) -> Result<Vec<Provider>>;

    /// Patients matching the criteria, pulled lazily
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be started. Errors reading
    /// individual records are yielded by the iterator.
    fn query_patients(&self, criteria: &PatientCriteria) -> Result<PatientIter<'_>>;
}
