//! Criterion matching against patient records
//!
//! Matching is pure: the same criterion, record and period always give the
//! same answer.

use super::MeasurementPeriod;
use crate::domain::{Criterion, PatientRecord, Window};
use chrono::{Months, NaiveDate};

/// Date bounds of a window, lower bound `None` meaning unbounded
fn bounds(window: Window, period: &MeasurementPeriod) -> (Option<NaiveDate>, NaiveDate) {
    match window {
        Window::Ever => (None, period.end),
        Window::MeasurementPeriod | Window::ActiveInPeriod => (Some(period.begin), period.end),
        Window::MonthsBeforeEnd(months) => (
            Some(
                period
                    .end
                    .checked_sub_months(Months::new(months))
                    .unwrap_or(NaiveDate::MIN),
            ),
            period.end,
        ),
    }
}

fn within(date: NaiveDate, from: Option<NaiveDate>, to: NaiveDate) -> bool {
    date <= to && from.map_or(true, |from| date >= from)
}

/// Matches a code against a list of patterns
///
/// An empty pattern list matches everything. A pattern ending in `*` matches
/// by prefix, anything else must match exactly.
pub fn code_matches(code: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => code.starts_with(prefix),
        None => code == pattern,
    })
}

/// Evaluates a criterion for one patient
pub fn matches(criterion: &Criterion, patient: &PatientRecord, period: &MeasurementPeriod) -> bool {
    match criterion {
        Criterion::Always => true,

        Criterion::Age { min, max } => {
            let age = patient.age_on(period.begin);
            min.map_or(true, |min| age >= min) && max.map_or(true, |max| age <= max)
        }

        Criterion::Sex { sex } => patient.sex == *sex,

        Criterion::Encounters { min, codes, window } => {
            let (from, to) = bounds(*window, period);
            let count = patient
                .encounters
                .iter()
                .filter(|e| within(e.date, from, to))
                .filter(|e| match &e.code {
                    Some(code) => code_matches(code, codes),
                    None => codes.is_empty(),
                })
                .count();
            count >= *min
        }

        Criterion::Entry { kind, codes, window } => {
            let (from, to) = bounds(*window, period);
            patient
                .entries
                .iter()
                .filter(|e| e.kind == *kind && code_matches(&e.code, codes))
                .any(|e| match window {
                    Window::ActiveInPeriod => e.overlaps(period.begin, period.end),
                    _ => within(e.start, from, to),
                })
        }

        Criterion::Vital {
            field,
            window,
            min,
            max,
        } => {
            let (from, to) = bounds(*window, period);
            let latest = patient
                .vitals
                .iter()
                .filter(|v| within(v.date, from, to))
                .filter_map(|v| v.value(*field).map(|value| (v.date, value)))
                .max_by_key(|(date, _)| *date);

            match latest {
                Some((_, value)) => {
                    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
                }
                None => false,
            }
        }

        Criterion::All { of } => of.iter().all(|c| matches(c, patient, period)),
        Criterion::Any { of } => of.iter().any(|c| matches(c, patient, period)),
        Criterion::Not { criterion } => !matches(criterion, patient, period),
    }
}
