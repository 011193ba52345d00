//! Integration tests for the patient source adapters

use std::path::PathBuf;
use tally::adapters::source::{
    create_patient_source, JsonlSource, PatientCriteria, PatientSource, ProviderRelationship,
    SnapshotSource,
};
use tally::config::SourceConfig;
use tally::domain::{ProviderId, SourceError, TallyError};
use tempfile::TempDir;

const PROVIDERS: &str = r#"[
  {"id": "7", "first_name": "Ada", "last_name": "Byron", "npi": "1234567893", "federal_tax_id": "12-3456789"},
  {"id": "9", "last_name": "Curie"}
]"#;

const PATIENTS: &str = r#"{"pid": "1", "provider_id": "7", "date_of_birth": "1950-01-01"}
{"pid": "2", "provider_id": "9", "date_of_birth": "1960-02-02", "encounters": [{"date": "2016-01-10", "provider_id": "7"}]}

{"pid": "3", "provider_id": "7", "sex": "female", "date_of_birth": "1970-03-03"}
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn pids(source: &dyn PatientSource, provider: &str, relationship: ProviderRelationship) -> Vec<String> {
    let criteria = PatientCriteria::new(ProviderId::new(provider).unwrap(), relationship);
    source
        .query_patients(&criteria)
        .unwrap()
        .map(|p| p.unwrap().pid.into_inner())
        .collect()
}

fn snapshot_json() -> String {
    let patients: Vec<&str> = PATIENTS.lines().filter(|l| !l.trim().is_empty()).collect();
    format!(
        "{{\"providers\": {PROVIDERS}, \"patients\": [{}]}}",
        patients.join(",")
    )
}

#[test]
fn test_snapshot_and_jsonl_agree() {
    let dir = TempDir::new().unwrap();
    let providers = write(&dir, "providers.json", PROVIDERS);
    let patients = write(&dir, "patients.jsonl", PATIENTS);

    let jsonl = JsonlSource::open(&providers, patients).unwrap();
    let snapshot = SnapshotSource::from_json(&snapshot_json(), "inline").unwrap();

    for source in [&jsonl as &dyn PatientSource, &snapshot] {
        let providers = source.providers().unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].npi.as_deref(), Some("1234567893"));

        assert_eq!(pids(source, "7", ProviderRelationship::Primary), vec!["1", "3"]);
        assert_eq!(pids(source, "7", ProviderRelationship::Encounter), vec!["2"]);
        assert_eq!(pids(source, "9", ProviderRelationship::Primary), vec!["2"]);
    }
}

#[test]
fn test_jsonl_invalid_line_is_yielded_with_location() {
    let dir = TempDir::new().unwrap();
    let providers = write(&dir, "providers.json", PROVIDERS);
    let patients = write(
        &dir,
        "patients.jsonl",
        "{\"pid\": \"1\", \"provider_id\": \"7\", \"date_of_birth\": \"1950-01-01\"}\n{not json}\n",
    );

    let source = JsonlSource::open(&providers, patients).unwrap();
    let criteria = PatientCriteria::new(ProviderId::new("7").unwrap(), ProviderRelationship::Primary);
    let records: Vec<_> = source.query_patients(&criteria).unwrap().collect();

    assert_eq!(records.len(), 2);
    assert!(records[0].is_ok());
    match &records[1] {
        Err(TallyError::Source(SourceError::InvalidRecord { location, .. })) => {
            assert!(location.ends_with("patients.jsonl:2"));
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn test_snapshot_rejects_empty_ids() {
    let result = SnapshotSource::from_json(
        r#"{"providers": [{"id": ""}], "patients": []}"#,
        "inline",
    );
    assert!(matches!(
        result,
        Err(TallyError::Source(SourceError::InvalidRecord { .. }))
    ));
}

#[test]
fn test_factory_selects_adapter() {
    let dir = TempDir::new().unwrap();
    let providers = write(&dir, "providers.json", PROVIDERS);
    let patients = write(&dir, "patients.jsonl", PATIENTS);
    let snapshot = write(&dir, "snapshot.json", &snapshot_json());

    let jsonl = create_patient_source(&SourceConfig {
        kind: "jsonl".to_string(),
        path: patients.display().to_string(),
        providers_path: Some(providers.display().to_string()),
    })
    .unwrap();
    assert_eq!(jsonl.name(), "jsonl");

    let snapshot = create_patient_source(&SourceConfig {
        kind: "snapshot".to_string(),
        path: snapshot.display().to_string(),
        providers_path: None,
    })
    .unwrap();
    assert_eq!(snapshot.name(), "snapshot");
}

#[test]
fn test_factory_missing_file() {
    let result = create_patient_source(&SourceConfig {
        kind: "snapshot".to_string(),
        path: "/nonexistent/patients.json".to_string(),
        providers_path: None,
    });
    assert!(matches!(
        result,
        Err(TallyError::Source(SourceError::ReadFailed { .. }))
    ));
}
