//! Result rows produced by the aggregator and consumed by the emitter
//!
//! The row stream is the contract between aggregation and emission: a
//! [`ResultRow::Plan`] opens a measure group, a [`ResultRow::Provider`] opens
//! a provider scope, and [`ResultRow::Measure`] rows fill the open provider.

use super::errors::RateError;
use super::ids::{PlanId, RuleId};
use super::patient::Provider;
use super::rule::{MeasureCodes, RuleCategory};
use serde::Serialize;
use std::fmt;

/// Percentage with the zero-denominator case made explicit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    Percent(f64),
    /// The denominator was zero
    NotApplicable,
}

impl Rate {
    /// `part / whole * 100`, recovering from a zero denominator
    pub fn of(part: u64, whole: u64) -> Self {
        match percentage(part, whole) {
            Ok(value) => Rate::Percent(value),
            Err(RateError::DivisionByZero) => {
                tracing::trace!(part, "Zero denominator, rate not applicable");
                Rate::NotApplicable
            }
        }
    }

    /// Numeric value, 0 when not applicable
    pub fn value(&self) -> f64 {
        match self {
            Rate::Percent(value) => *value,
            Rate::NotApplicable => 0.0,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Rate::Percent(_))
    }

    /// Registry document form: `50%`, `83.33%`, and `0%` when not applicable
    pub fn to_registry_string(&self) -> String {
        format!("{}%", format_decimal(self.value()))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Percent(value) => write!(f, "{}%", format_decimal(*value)),
            Rate::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Raw percentage; fails on a zero denominator
pub fn percentage(part: u64, whole: u64) -> Result<f64, RateError> {
    if whole == 0 {
        return Err(RateError::DivisionByZero);
    }
    Ok(part as f64 / whole as f64 * 100.0)
}

/// At most two decimals, trailing zeros trimmed
fn format_decimal(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether a measure row is a headline result or an itemized action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrigin {
    Main,
    Sub,
}

/// Scope-tracking tag of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowTag {
    Main,
    Sub,
    Provider,
    Plan,
}

/// Result of one population/numerator pair (or one action) of a rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureRow {
    pub origin: RowOrigin,
    pub rule_id: RuleId,
    pub category: RuleCategory,
    pub title: String,
    pub codes: MeasureCodes,
    pub population_label: String,
    pub numerator_label: String,

    /// Action label for `sub` rows
    pub action: Option<String>,

    /// Patients in the initial population
    pub total_patients: u64,

    /// Eligible patients (denominator)
    pub pass_filter: u64,

    /// Denominator exclusions
    pub excluded: u64,

    /// Patients meeting the numerator
    pub pass_target: u64,

    pub performance_rate: Rate,
    pub reporting_rate: Rate,
}

impl MeasureRow {
    /// Eligible instances that neither met the target nor were excluded
    pub fn performance_not_met(&self) -> i64 {
        self.pass_filter as i64 - self.pass_target as i64 - self.excluded as i64
    }

    /// Recomputes both rates from the counts
    pub(crate) fn with_rates(mut self) -> Self {
        self.performance_rate = Rate::of(self.pass_target, self.pass_filter);
        self.reporting_rate = Rate::of(
            self.pass_filter.saturating_sub(self.excluded),
            self.pass_filter,
        );
        self
    }
}

/// Provider scope marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRow {
    pub provider: Provider,
}

/// Plan (measure group) scope marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    pub plan_id: PlanId,
    pub title: String,
    pub measure_group: String,
}

/// A row of the aggregated report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "row", rename_all = "lowercase")]
pub enum ResultRow {
    Measure(MeasureRow),
    Provider(ProviderRow),
    Plan(PlanRow),
}

impl ResultRow {
    pub fn tag(&self) -> RowTag {
        match self {
            ResultRow::Measure(row) => match row.origin {
                RowOrigin::Main => RowTag::Main,
                RowOrigin::Sub => RowTag::Sub,
            },
            ResultRow::Provider(_) => RowTag::Provider,
            ResultRow::Plan(_) => RowTag::Plan,
        }
    }
}

/// Trailing numeric token of a population or numerator label, else `1`
///
/// `Population Criteria 2` reports as `2`; an empty or unnumbered label
/// reports as `1`.
pub fn label_number(label: &str) -> &str {
    match label.split(' ').last() {
        Some(token) if !token.is_empty() && token.parse::<f64>().is_ok() => token,
        _ => "1",
    }
}
