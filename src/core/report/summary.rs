//! Report summary
//!
//! This module defines the record of what a report run produced.

use crate::core::aggregate::{AggregationStats, SkippedRule};
use crate::core::collate::CollationMode;
use crate::core::emit::EmitterStats;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Summary of a report run
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Unique id of this run
    pub report_id: Uuid,

    pub rule_set: String,
    pub mode: CollationMode,
    pub target_date: NaiveDateTime,

    /// Measure groups written
    pub measure_groups: usize,

    /// Provider scopes written
    pub providers: usize,

    /// `pqri-measure` elements written
    pub measures_written: usize,

    /// Action rows left out of the document
    pub sub_rows: usize,

    /// Patient records evaluated
    pub patients_evaluated: usize,

    pub batches: usize,

    /// Rules left out of the report
    pub skipped_rules: Vec<SkippedRule>,

    /// SHA-256 of the document
    pub checksum: String,

    pub document_bytes: usize,

    /// Duration of the run in milliseconds
    pub duration_ms: u64,
}

impl ReportSummary {
    /// Create a summary from the counters of a finished run
    pub fn new(
        rule_set: impl Into<String>,
        mode: CollationMode,
        target_date: NaiveDateTime,
        aggregation: AggregationStats,
        emitter: EmitterStats,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            rule_set: rule_set.into(),
            mode,
            target_date,
            measure_groups: emitter.measure_groups,
            providers: emitter.providers,
            measures_written: emitter.measures,
            sub_rows: emitter.sub_rows_skipped,
            patients_evaluated: aggregation.patients,
            batches: aggregation.batches,
            skipped_rules: aggregation.skipped_rules,
            checksum: String::new(),
            document_bytes: 0,
            duration_ms: 0,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Record the document checksum and size
    pub fn with_document(mut self, checksum: &str, bytes: usize) -> Self {
        self.checksum = checksum.to_string();
        self.document_bytes = bytes;
        self
    }

    /// Whether every rule of the rule set was reported
    pub fn is_complete(&self) -> bool {
        self.skipped_rules.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            report_id = %self.report_id,
            rule_set = %self.rule_set,
            mode = %self.mode,
            measure_groups = self.measure_groups,
            providers = self.providers,
            measures = self.measures_written,
            patients = self.patients_evaluated,
            batches = self.batches,
            checksum = %self.checksum,
            duration_ms = self.duration_ms,
            "Report summary"
        );

        if !self.skipped_rules.is_empty() {
            tracing::warn!(
                skipped = self.skipped_rules.len(),
                "Report completed with skipped rules"
            );
            for skipped in &self.skipped_rules {
                tracing::warn!(
                    rule_id = %skipped.rule_id,
                    reason = %skipped.reason,
                    "Skipped rule"
                );
            }
        }
    }
}
