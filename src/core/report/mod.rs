//! Report generation entry point
//!
//! [`generate_report`] wires the pipeline together:
//!
//! ```text
//! RuleCatalog -> collate -> aggregate (evaluators) -> emit -> ReportDocument
//! ```
//!
//! Every input, including the document creation timestamp, is part of the
//! [`ReportRequest`], so the same request over the same data always yields
//! the same bytes.

pub mod summary;

pub use summary::ReportSummary;

use crate::adapters::source::{PatientSource, ProviderRelationship};
use crate::config::TallyConfig;
use crate::core::aggregate::aggregate;
use crate::core::catalog::RuleCatalog;
use crate::core::collate::{collate, CollateOptions, CollationMode, Grouping};
use crate::core::emit::{emit_document, EmitterSettings, RegistryInfo, ReportDocument};
use crate::core::evaluate::{EvaluationContext, EvaluatorRegistry};
use crate::domain::{ProviderId, Result, RuleSetId, TallyError};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::str::FromStr;
use std::time::Instant;

/// Default number of patients per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Parses a target date given as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or
/// `YYYY-MM-DDTHH:MM:SS`
pub fn parse_target_date(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            TallyError::Validation(format!(
                "'{value}' is not a date (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)"
            ))
        })
}

/// Inputs of one report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub rule_set: RuleSetId,
    pub target_date: NaiveDateTime,
    pub mode: CollationMode,
    pub grouping: Grouping,
    pub batch_size: usize,
    pub amc_begin: Option<NaiveDate>,
    pub registry: RegistryInfo,
    /// Timestamp written to the file audit data
    pub created_at: NaiveDateTime,
}

impl ReportRequest {
    /// A request with default mode, grouping, batch size and registry
    pub fn new(rule_set: RuleSetId, target_date: NaiveDateTime, created_at: NaiveDateTime) -> Self {
        let registry = crate::config::RegistryConfig::default();
        Self {
            rule_set,
            target_date,
            mode: CollationMode::Outer,
            grouping: Grouping::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            amc_begin: None,
            registry: RegistryInfo {
                name: registry.name,
                id: registry.id,
                created_by: registry.created_by,
                version: registry.version,
            },
            created_at,
        }
    }

    pub fn with_mode(mut self, mode: CollationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_amc_begin(mut self, begin: Option<NaiveDate>) -> Self {
        self.amc_begin = begin;
        self
    }

    /// Builds a request from validated configuration
    ///
    /// Without a configured target date the report targets `created_at`.
    pub fn from_config(config: &TallyConfig, created_at: NaiveDateTime) -> Result<Self> {
        let report = &config.report;

        let rule_set = RuleSetId::new(report.rule_set.as_str()).map_err(TallyError::Configuration)?;
        let mode = CollationMode::from_str(&report.mode).map_err(TallyError::Configuration)?;
        let relationship = ProviderRelationship::from_str(&report.provider_relationship)
            .map_err(TallyError::Configuration)?;
        let providers = report
            .providers
            .iter()
            .map(|p| ProviderId::new(p.as_str()).map_err(TallyError::Configuration))
            .collect::<Result<Vec<_>>>()?;
        let target_date = match &report.target_date {
            Some(date) => parse_target_date(date)?,
            None => created_at,
        };
        let amc_begin = report
            .amc_begin_date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
                    TallyError::Configuration(format!("Invalid report.amc_begin_date '{d}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            rule_set,
            target_date,
            mode,
            grouping: Grouping {
                relationship,
                providers,
            },
            batch_size: report.batch_size,
            amc_begin,
            registry: RegistryInfo {
                name: config.registry.name.clone(),
                id: config.registry.id.clone(),
                created_by: config.registry.created_by.clone(),
                version: config.registry.version.clone(),
            },
            created_at,
        })
    }
}

/// Result of a report run
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub document: ReportDocument,
    pub summary: ReportSummary,
}

/// Generates a registry report with the standard CQM and AMC evaluators
///
/// # Errors
///
/// Fails on an unknown rule set, a patient source error, or a structural
/// violation of the document. Rules that cannot be evaluated are skipped and
/// listed in the summary instead.
pub fn generate_report(
    request: &ReportRequest,
    catalog: &RuleCatalog,
    source: &dyn PatientSource,
) -> Result<ReportOutcome> {
    generate_report_with(request, catalog, &EvaluatorRegistry::standard(), source)
}

/// Generates a registry report with a custom evaluator registry
pub fn generate_report_with(
    request: &ReportRequest,
    catalog: &RuleCatalog,
    evaluators: &EvaluatorRegistry,
    source: &dyn PatientSource,
) -> Result<ReportOutcome> {
    let started = Instant::now();
    crate::log_report_start!(request.rule_set, request.mode, request.target_date);

    let options = CollateOptions {
        mode: request.mode,
        grouping: request.grouping.clone(),
        batch_size: request.batch_size,
    };
    let collation = collate(catalog, &request.rule_set, source, &options)?;

    let context = EvaluationContext::new(request.target_date).with_amc_begin(request.amc_begin);
    let mut aggregation = aggregate(catalog, evaluators, context, collation);

    let settings = EmitterSettings {
        mode: request.mode,
        registry: request.registry.clone(),
        created_at: request.created_at,
        reporting_year: request.target_date.year(),
    };
    let (document, emitter_stats) = emit_document(settings, aggregation.by_ref())?;

    let duration = started.elapsed();
    let summary = ReportSummary::new(
        request.rule_set.as_str(),
        request.mode,
        request.target_date,
        aggregation.into_stats(),
        emitter_stats,
    )
    .with_duration(duration)
    .with_document(document.checksum(), document.len());

    crate::log_report_complete!(summary.measures_written, duration);

    Ok(ReportOutcome { document, summary })
}
