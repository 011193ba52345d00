//! Patient and provider records
//!
//! These are the records a [`PatientSource`](crate::adapters::source::PatientSource)
//! hands to the collator. They carry just enough clinical history for the
//! measure criteria to be evaluated.

use super::ids::{PatientId, ProviderId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Administrative sex as recorded in demographics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    #[default]
    Unknown,
}

/// Healthcare provider (eligible professional)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// National provider identifier
    #[serde(default)]
    pub npi: Option<String>,

    /// Federal tax id (TIN)
    #[serde(default)]
    pub federal_tax_id: Option<String>,
}

impl Provider {
    /// Display name in `Last, First` form
    pub fn display_name(&self) -> String {
        match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, false) => self.first_name.clone(),
            (true, true) => self.id.to_string(),
        }
    }
}

/// Kind of a dated clinical entry in the patient's chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Problem,
    Medication,
    Allergy,
    Immunization,
    Procedure,
    Intervention,
    /// Tobacco use assessment; the code carries the recorded status
    Tobacco,
}

/// A coded clinical entry (problem, medication, immunization, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEntry {
    pub kind: EntryKind,

    /// Coded value, `SYSTEM:CODE` by convention (e.g. `ICD9:250.00`, `CVX:88`)
    pub code: String,

    /// Onset / administration / assessment date
    pub start: NaiveDate,

    /// Resolution date, `None` while still active
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl ClinicalEntry {
    /// Whether the entry's span overlaps `[from, to]`
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start <= to && self.end.map_or(true, |end| end >= from)
    }
}

/// An encounter (visit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub date: NaiveDate,

    /// Encounter type code, e.g. `CPT:99213`
    #[serde(default)]
    pub code: Option<String>,

    /// Rendering provider of the encounter
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
}

/// A vital sign field that criteria can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    /// Systolic blood pressure
    Bps,
    /// Diastolic blood pressure
    Bpd,
    Weight,
    Height,
    Bmi,
}

/// One vitals form entry; any field may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub date: NaiveDate,

    #[serde(default)]
    pub bps: Option<f64>,

    #[serde(default)]
    pub bpd: Option<f64>,

    #[serde(default)]
    pub weight: Option<f64>,

    #[serde(default)]
    pub height: Option<f64>,

    #[serde(default)]
    pub bmi: Option<f64>,
}

impl VitalReading {
    /// Value of a single field, if recorded
    pub fn value(&self, field: VitalField) -> Option<f64> {
        match field {
            VitalField::Bps => self.bps,
            VitalField::Bpd => self.bpd,
            VitalField::Weight => self.weight,
            VitalField::Height => self.height,
            VitalField::Bmi => self.bmi,
        }
    }
}

/// A patient as seen by the measure evaluators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub pid: PatientId,

    /// Primary care provider
    #[serde(default)]
    pub provider_id: Option<ProviderId>,

    #[serde(default)]
    pub sex: Sex,

    pub date_of_birth: NaiveDate,

    #[serde(default)]
    pub encounters: Vec<Encounter>,

    #[serde(default)]
    pub entries: Vec<ClinicalEntry>,

    #[serde(default)]
    pub vitals: Vec<VitalReading>,
}

impl PatientRecord {
    /// Creates a patient with demographics only
    pub fn new(pid: PatientId, date_of_birth: NaiveDate) -> Self {
        Self {
            pid,
            provider_id: None,
            sex: Sex::Unknown,
            date_of_birth,
            encounters: Vec::new(),
            entries: Vec::new(),
            vitals: Vec::new(),
        }
    }

    /// Age in whole years on the given date
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        let mut age = date.year() - self.date_of_birth.year();
        if (date.month(), date.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Whether the patient had an encounter rendered by the given provider
    pub fn seen_by(&self, provider_id: &ProviderId) -> bool {
        self.encounters
            .iter()
            .any(|e| e.provider_id.as_ref() == Some(provider_id))
    }
}

/// Ordered group of patients evaluated together
///
/// Batches bound the memory a report needs: the collator never holds more
/// than one batch of records at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientBatch {
    patients: Vec<PatientRecord>,
}

impl PatientBatch {
    pub fn new(patients: Vec<PatientRecord>) -> Self {
        Self { patients }
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatientRecord> {
        self.patients.iter()
    }

    /// Patient ids in batch order
    pub fn patient_ids(&self) -> Vec<&PatientId> {
        self.patients.iter().map(|p| &p.pid).collect()
    }
}

impl FromIterator<PatientRecord> for PatientBatch {
    fn from_iter<I: IntoIterator<Item = PatientRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_on_before_and_after_birthday() {
        let patient = PatientRecord::new(PatientId::new("1").unwrap(), date(1950, 6, 15));
        assert_eq!(patient.age_on(date(2016, 6, 14)), 65);
        assert_eq!(patient.age_on(date(2016, 6, 15)), 66);
    }

    #[test]
    fn test_age_on_before_birth_is_zero() {
        let patient = PatientRecord::new(PatientId::new("1").unwrap(), date(2020, 1, 1));
        assert_eq!(patient.age_on(date(2016, 1, 1)), 0);
    }

    #[test]
    fn test_entry_overlaps() {
        let entry = ClinicalEntry {
            kind: EntryKind::Problem,
            code: "ICD9:401.1".to_string(),
            start: date(2010, 1, 1),
            end: Some(date(2015, 1, 1)),
        };
        assert!(entry.overlaps(date(2014, 6, 1), date(2016, 6, 1)));
        assert!(!entry.overlaps(date(2015, 6, 1), date(2016, 6, 1)));

        let active = ClinicalEntry { end: None, ..entry };
        assert!(active.overlaps(date(2015, 6, 1), date(2016, 6, 1)));
    }

    #[test]
    fn test_seen_by() {
        let mut patient = PatientRecord::new(PatientId::new("1").unwrap(), date(1960, 1, 1));
        let provider = ProviderId::new("7").unwrap();
        assert!(!patient.seen_by(&provider));

        patient.encounters.push(Encounter {
            date: date(2016, 2, 1),
            code: None,
            provider_id: Some(provider.clone()),
        });
        assert!(patient.seen_by(&provider));
    }

    #[test]
    fn test_provider_display_name() {
        let provider = Provider {
            id: ProviderId::new("7").unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            npi: None,
            federal_tax_id: None,
        };
        assert_eq!(provider.display_name(), "Byron, Ada");
    }

    #[test]
    fn test_patient_deserialize_defaults() {
        let json = r#"{"pid": "42", "date_of_birth": "1948-03-02"}"#;
        let patient: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(patient.pid.as_str(), "42");
        assert_eq!(patient.sex, Sex::Unknown);
        assert!(patient.encounters.is_empty());
    }
}
