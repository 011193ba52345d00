//! Registry document emission
//!
//! [`ReportEmitter`] consumes the result-row stream in a single forward pass
//! and writes a PQRI registry XML document. Scope changes are driven only by
//! the tag of the current row and the emitter's [`EmitterState`]:
//!
//! | row        | state                       | action                                   |
//! |------------|-----------------------------|------------------------------------------|
//! | first row  | `Empty`                     | open submission, audit data, registry    |
//! | provider   | `MeasureGroupOpen`          | open provider                            |
//! | provider   | `ProviderOpen`              | close provider, open provider            |
//! | plan       | any (inner mode)            | close provider and group, open group     |
//! | main       | `ProviderOpen`              | write measure                            |
//! | sub        | any                         | ignored                                  |
//!
//! Anything else is a [`TallyError::MalformedScope`].

pub mod xml;

pub use xml::RegistryXmlWriter;

use crate::core::collate::CollationMode;
use crate::core::verification::checksum::calculate_checksum_bytes;
use crate::domain::row::label_number;
use crate::domain::{MeasureRow, PlanRow, ProviderRow, Result, ResultRow, RowOrigin, TallyError};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Measure group used for the single flat group of outer mode
pub const FLAT_MEASURE_GROUP: &str = "X";

const SUBMISSION: &str = "submission";
const REGISTRY: &str = "registry";
const MEASURE_GROUP: &str = "measure-group";
const PROVIDER: &str = "provider";
const MEASURE: &str = "pqri-measure";

/// Registry identification written to the document header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryInfo {
    pub name: String,
    pub id: String,
    pub created_by: String,
    pub version: String,
}

/// Everything the emitter needs besides the rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterSettings {
    pub mode: CollationMode,
    pub registry: RegistryInfo,
    /// Creation timestamp written to the file audit data
    pub created_at: NaiveDateTime,
    /// Year whose encounters the providers report
    pub reporting_year: i32,
}

/// Named emitter states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmitterState {
    Empty,
    RegistryOpen,
    MeasureGroupOpen,
    ProviderOpen,
}

/// A finished registry document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    bytes: Vec<u8>,
    checksum: String,
}

impl ReportDocument {
    fn new(bytes: Vec<u8>) -> Self {
        let checksum = calculate_checksum_bytes(&bytes);
        Self { bytes, checksum }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The document as text; the writer only produces UTF-8
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    /// Hex-encoded SHA-256 of the document bytes
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Counters of what was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmitterStats {
    pub measure_groups: usize,
    pub providers: usize,
    pub measures: usize,
    pub sub_rows_skipped: usize,
}

/// Streaming registry document emitter
pub struct ReportEmitter {
    writer: RegistryXmlWriter,
    state: EmitterState,
    settings: EmitterSettings,
    stats: EmitterStats,
}

impl ReportEmitter {
    pub fn new(settings: EmitterSettings) -> Result<Self> {
        Ok(Self {
            writer: RegistryXmlWriter::new()?,
            state: EmitterState::Empty,
            settings,
            stats: EmitterStats::default(),
        })
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Submission method of the registry element
    fn submission_method(&self) -> &'static str {
        match self.settings.mode {
            CollationMode::Outer => "A",
            CollationMode::Inner => "E",
        }
    }

    fn begin(&mut self) -> Result<()> {
        let created_at = self.settings.created_at;
        let registry = self.settings.registry.clone();

        self.writer.open(
            SUBMISSION,
            &[
                ("type", "PQRI-REGISTRY"),
                ("option", "payment"),
                ("version", "2.0"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
                ("xsi:noNamespaceSchemaLocation", "Registry_Payment.xsd"),
            ],
        )?;

        self.writer.open("file-audit-data", &[])?;
        self.writer
            .element("create-date", &created_at.format("%m-%d-%Y").to_string())?;
        self.writer
            .element("create-time", &created_at.format("%H:%M").to_string())?;
        self.writer.element("create-by", &registry.created_by)?;
        self.writer.element("version", &registry.version)?;
        self.writer.element("file-number", "1")?;
        self.writer.element("number-of-files", "1")?;
        self.writer.close("file-audit-data")?;

        self.writer.open(REGISTRY, &[])?;
        self.writer.element("registry-name", &registry.name)?;
        self.writer.element("registry-id", &registry.id)?;
        let method = self.submission_method();
        self.writer.element("submission-method", method)?;
        self.state = EmitterState::RegistryOpen;

        if self.settings.mode == CollationMode::Outer {
            self.open_measure_group(FLAT_MEASURE_GROUP)?;
        }
        Ok(())
    }

    fn open_measure_group(&mut self, id: &str) -> Result<()> {
        self.writer.open(MEASURE_GROUP, &[("ID", id)])?;
        self.stats.measure_groups += 1;
        self.state = EmitterState::MeasureGroupOpen;
        Ok(())
    }

    fn close_provider(&mut self) -> Result<()> {
        self.writer.close(PROVIDER)?;
        self.state = EmitterState::MeasureGroupOpen;
        Ok(())
    }

    fn close_measure_group(&mut self) -> Result<()> {
        self.writer.close(MEASURE_GROUP)?;
        self.state = EmitterState::RegistryOpen;
        Ok(())
    }

    fn provider(&mut self, row: &ProviderRow) -> Result<()> {
        match self.state {
            EmitterState::ProviderOpen => self.close_provider()?,
            EmitterState::MeasureGroupOpen => {}
            EmitterState::Empty | EmitterState::RegistryOpen => {
                return Err(TallyError::MalformedScope(format!(
                    "provider {} outside a measure group",
                    row.provider.id
                )))
            }
        }

        let year = self.settings.reporting_year;
        let provider = &row.provider;
        self.writer.open(PROVIDER, &[])?;
        if let Some(npi) = provider.npi.as_deref().filter(|v| !v.is_empty()) {
            self.writer.element("npi", npi)?;
        }
        if let Some(tin) = provider.federal_tax_id.as_deref().filter(|v| !v.is_empty()) {
            self.writer.element("tin", tin)?;
        }
        self.writer
            .element("encounter-from-date", &format!("01-01-{year}"))?;
        self.writer
            .element("encounter-to-date", &format!("12-31-{year}"))?;

        self.stats.providers += 1;
        self.state = EmitterState::ProviderOpen;
        Ok(())
    }

    fn plan(&mut self, row: &PlanRow) -> Result<()> {
        if self.settings.mode == CollationMode::Outer {
            return Err(TallyError::MalformedScope(format!(
                "plan {} in a flat (outer) report",
                row.plan_id
            )));
        }
        if self.state == EmitterState::ProviderOpen {
            self.close_provider()?;
        }
        if self.state == EmitterState::MeasureGroupOpen {
            self.close_measure_group()?;
        }
        self.open_measure_group(&row.measure_group)
    }

    fn measure(&mut self, row: &MeasureRow) -> Result<()> {
        if row.origin == RowOrigin::Sub {
            self.stats.sub_rows_skipped += 1;
            return Ok(());
        }
        if self.state != EmitterState::ProviderOpen {
            return Err(TallyError::MalformedScope(format!(
                "measure {} outside a provider",
                row.rule_id
            )));
        }

        tracing::trace!(
            rule_id = %row.rule_id,
            eligible = row.pass_filter,
            performance = %row.performance_rate,
            "Writing measure"
        );

        self.writer.open(MEASURE, &[])?;
        self.writer
            .element("pqri-measure-number", row.codes.measure_number())?;
        self.writer
            .element("patient-population", label_number(&row.population_label))?;
        self.writer
            .element("numerator", label_number(&row.numerator_label))?;
        self.writer
            .element("eligible-instances", &row.pass_filter.to_string())?;
        self.writer
            .element("meets-performance-instances", &row.pass_target.to_string())?;
        self.writer
            .element("performance-exclusion-instances", &row.excluded.to_string())?;
        self.writer.element(
            "performance-not-met-instances",
            &row.performance_not_met().to_string(),
        )?;
        self.writer
            .element("performance-rate", &row.performance_rate.to_registry_string())?;
        self.writer
            .element("reporting-rate", &row.reporting_rate.to_registry_string())?;
        self.writer.close(MEASURE)?;

        self.stats.measures += 1;
        Ok(())
    }

    /// Writes one row
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::MalformedScope`] when the row cannot be placed
    /// in the current scope.
    pub fn emit(&mut self, row: &ResultRow) -> Result<()> {
        if self.state == EmitterState::Empty {
            self.begin()?;
        }
        match row {
            ResultRow::Provider(provider) => self.provider(provider),
            ResultRow::Plan(plan) => self.plan(plan),
            ResultRow::Measure(measure) => self.measure(measure),
        }
    }

    /// Closes every open scope and returns the document
    pub fn finish(mut self) -> Result<ReportDocument> {
        if self.state == EmitterState::Empty {
            self.begin()?;
        }
        if self.state == EmitterState::ProviderOpen {
            self.close_provider()?;
        }
        if self.state == EmitterState::MeasureGroupOpen {
            self.close_measure_group()?;
        }
        self.writer.close(REGISTRY)?;
        self.writer.close(SUBMISSION)?;

        tracing::debug!(
            measure_groups = self.stats.measure_groups,
            providers = self.stats.providers,
            measures = self.stats.measures,
            "Registry document finished"
        );

        Ok(ReportDocument::new(self.writer.finish()?))
    }
}

/// Emits a complete row stream into a document
///
/// Stops at the first error, whether it comes from the stream or the emitter.
pub fn emit_document<I>(settings: EmitterSettings, rows: I) -> Result<(ReportDocument, EmitterStats)>
where
    I: IntoIterator<Item = Result<ResultRow>>,
{
    let mut emitter = ReportEmitter::new(settings)?;
    for row in rows {
        emitter.emit(&row?)?;
    }
    let stats = emitter.stats();
    Ok((emitter.finish()?, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MeasureCodes, PlanId, Provider, ProviderId, Rate, RuleCategory, RuleId,
    };
    use chrono::NaiveDate;

    fn settings(mode: CollationMode) -> EmitterSettings {
        EmitterSettings {
            mode,
            registry: RegistryInfo {
                name: "Model Registry".to_string(),
                id: "125789123".to_string(),
                created_by: "RegistryA".to_string(),
                version: "1.0".to_string(),
            },
            created_at: NaiveDate::from_ymd_opt(2016, 6, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            reporting_year: 2016,
        }
    }

    fn provider(id: &str) -> ResultRow {
        ResultRow::Provider(ProviderRow {
            provider: Provider {
                id: ProviderId::new(id).unwrap(),
                first_name: String::new(),
                last_name: String::new(),
                npi: Some(format!("npi-{id}")),
                federal_tax_id: None,
            },
        })
    }

    fn measure(origin: RowOrigin) -> ResultRow {
        ResultRow::Measure(
            MeasureRow {
                origin,
                rule_id: RuleId::new("rule_influenza_ge_50_cqm").unwrap(),
                category: RuleCategory::Cqm,
                title: "Influenza".to_string(),
                codes: MeasureCodes {
                    pqri: Some("110".to_string()),
                    nqf: Some("0041".to_string()),
                    amc: None,
                },
                population_label: String::new(),
                numerator_label: String::new(),
                action: None,
                total_patients: 10,
                pass_filter: 6,
                excluded: 1,
                pass_target: 3,
                performance_rate: Rate::NotApplicable,
                reporting_rate: Rate::NotApplicable,
            }
            .with_rates(),
        )
    }

    fn plan(group: &str) -> ResultRow {
        ResultRow::Plan(PlanRow {
            plan_id: PlanId::new(format!("plan_{group}")).unwrap(),
            title: group.to_string(),
            measure_group: group.to_string(),
        })
    }

    #[test]
    fn test_state_transitions() {
        let mut emitter = ReportEmitter::new(settings(CollationMode::Outer)).unwrap();
        assert_eq!(emitter.state(), EmitterState::Empty);
        emitter.emit(&provider("1")).unwrap();
        assert_eq!(emitter.state(), EmitterState::ProviderOpen);
        emitter.emit(&measure(RowOrigin::Main)).unwrap();
        assert_eq!(emitter.state(), EmitterState::ProviderOpen);
        emitter.emit(&measure(RowOrigin::Sub)).unwrap();
        assert_eq!(emitter.stats().measures, 1);
        assert_eq!(emitter.stats().sub_rows_skipped, 1);
    }

    #[test]
    fn test_measure_content() {
        let (document, _) = emit_document(
            settings(CollationMode::Outer),
            vec![Ok(provider("1")), Ok(measure(RowOrigin::Main))],
        )
        .unwrap();
        let xml = document.as_str();

        assert!(xml.contains("<create-date>06-01-2016</create-date>"));
        assert!(xml.contains("<create-time>09:30</create-time>"));
        assert!(xml.contains("<submission-method>A</submission-method>"));
        assert!(xml.contains("<measure-group ID=\"X\">"));
        assert!(xml.contains("<npi>npi-1</npi>"));
        assert!(!xml.contains("<tin>"));
        assert!(xml.contains("<encounter-from-date>01-01-2016</encounter-from-date>"));
        assert!(xml.contains("<encounter-to-date>12-31-2016</encounter-to-date>"));
        assert!(xml.contains("<pqri-measure-number>110</pqri-measure-number>"));
        assert!(xml.contains("<patient-population>1</patient-population>"));
        assert!(xml.contains("<eligible-instances>6</eligible-instances>"));
        assert!(xml.contains("<meets-performance-instances>3</meets-performance-instances>"));
        assert!(xml.contains("<performance-exclusion-instances>1</performance-exclusion-instances>"));
        assert!(xml.contains("<performance-not-met-instances>2</performance-not-met-instances>"));
        assert!(xml.contains("<performance-rate>50%</performance-rate>"));
        assert!(xml.contains("<reporting-rate>83.33%</reporting-rate>"));
        assert_eq!(document.checksum().len(), 64);
    }

    #[test]
    fn test_inner_mode_plans() {
        let (document, stats) = emit_document(
            settings(CollationMode::Inner),
            vec![
                Ok(plan("A")),
                Ok(provider("1")),
                Ok(measure(RowOrigin::Main)),
                Ok(plan("D")),
                Ok(provider("1")),
                Ok(measure(RowOrigin::Main)),
            ],
        )
        .unwrap();
        let xml = document.as_str();

        assert!(xml.contains("<submission-method>E</submission-method>"));
        assert!(xml.contains("<measure-group ID=\"A\">"));
        assert!(xml.contains("<measure-group ID=\"D\">"));
        assert!(!xml.contains("<measure-group ID=\"X\">"));
        assert_eq!(xml.matches("</measure-group>").count(), 2);
        assert_eq!(stats.measure_groups, 2);
        assert_eq!(stats.providers, 2);
    }

    #[test]
    fn test_plan_in_outer_mode_is_malformed() {
        let mut emitter = ReportEmitter::new(settings(CollationMode::Outer)).unwrap();
        assert!(matches!(
            emitter.emit(&plan("A")),
            Err(TallyError::MalformedScope(_))
        ));
    }

    #[test]
    fn test_measure_without_provider_is_malformed() {
        let mut emitter = ReportEmitter::new(settings(CollationMode::Outer)).unwrap();
        assert!(matches!(
            emitter.emit(&measure(RowOrigin::Main)),
            Err(TallyError::MalformedScope(_))
        ));
    }

    #[test]
    fn test_provider_without_measure_group_is_malformed() {
        let mut emitter = ReportEmitter::new(settings(CollationMode::Inner)).unwrap();
        assert!(matches!(
            emitter.emit(&provider("1")),
            Err(TallyError::MalformedScope(_))
        ));
    }

    #[test]
    fn test_empty_stream_outer() {
        let (document, stats) =
            emit_document(settings(CollationMode::Outer), Vec::new()).unwrap();
        let xml = document.as_str();
        assert!(xml.contains("<measure-group ID=\"X\">"));
        assert!(xml.contains("</measure-group>"));
        assert!(xml.trim_end().ends_with("</submission>"));
        assert_eq!(stats.providers, 0);
    }

    #[test]
    fn test_empty_stream_inner() {
        let (document, _) = emit_document(settings(CollationMode::Inner), Vec::new()).unwrap();
        let xml = document.as_str();
        assert!(!xml.contains("measure-group"));
        assert!(xml.contains("</registry>"));
    }

    #[test]
    fn test_stream_error_stops_emission() {
        let result = emit_document(
            settings(CollationMode::Outer),
            vec![
                Ok(provider("1")),
                Err(TallyError::Other("boom".to_string())),
            ],
        );
        assert!(matches!(result, Err(TallyError::Other(_))));
    }
}
