//! Automated measure calculation evaluator

use super::{EvaluationContext, MeasureEvaluator, MeasurementPeriod};
use crate::domain::RuleCategory;

/// Evaluates AMC rules
///
/// The period starts at the configured AMC begin date when one is given,
/// otherwise one year before the target. Exclusions are not part of AMC
/// measures and are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmcEvaluator;

impl MeasureEvaluator for AmcEvaluator {
    fn category(&self) -> RuleCategory {
        RuleCategory::Amc
    }

    fn measurement_period(&self, context: &EvaluationContext) -> MeasurementPeriod {
        let trailing = context.trailing_year();
        match context.amc_begin {
            Some(begin) if begin <= trailing.end => MeasurementPeriod {
                begin,
                end: trailing.end,
            },
            Some(begin) => {
                tracing::warn!(
                    begin = %begin,
                    target = %trailing.end,
                    "AMC begin date is after the target date, using trailing year"
                );
                trailing
            }
            None => trailing,
        }
    }

    fn applies_exclusions(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Criterion, MeasureCodes, Numerator, PatientBatch, PatientId, PatientRecord, Population,
        RuleDefinition, RuleId,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_amc_period_uses_begin_date() {
        let context = EvaluationContext::new(date(2016, 12, 31).and_hms_opt(0, 0, 0).unwrap())
            .with_amc_begin(Some(date(2016, 7, 1)));
        let period = AmcEvaluator.measurement_period(&context);
        assert_eq!(period.begin, date(2016, 7, 1));
        assert_eq!(period.end, date(2016, 12, 31));

        let context = context.with_amc_begin(Some(date(2017, 1, 1)));
        assert_eq!(AmcEvaluator.measurement_period(&context).begin, date(2015, 12, 31));
    }

    #[test]
    fn test_amc_ignores_exclusions() {
        let rule = RuleDefinition {
            id: RuleId::new("problem_list_amc").unwrap(),
            category: RuleCategory::Amc,
            title: "Problem list".to_string(),
            codes: MeasureCodes::default(),
            populations: vec![Population {
                label: String::new(),
                initial: Criterion::Always,
                denominator: Criterion::Always,
                exclusion: Some(Criterion::Always),
                numerators: vec![Numerator {
                    label: String::new(),
                    criterion: Criterion::Always,
                }],
            }],
            actions: Vec::new(),
        };
        let batch = PatientBatch::new(vec![PatientRecord::new(
            PatientId::new("1").unwrap(),
            date(1980, 1, 1),
        )]);
        let context = EvaluationContext::new(date(2016, 12, 31).and_hms_opt(0, 0, 0).unwrap());
        let tally = AmcEvaluator.evaluate(&rule, &batch, &context);
        assert_eq!(tally.populations[0].excluded, 0);
        assert_eq!(tally.populations[0].numerators, vec![1]);
    }
}
