//! Clinical quality measure evaluator

use super::{EvaluationContext, MeasureEvaluator, MeasurementPeriod};
use crate::domain::RuleCategory;

/// Evaluates CQM rules over the year ending on the target date
///
/// Denominator exclusions apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct CqmEvaluator;

impl MeasureEvaluator for CqmEvaluator {
    fn category(&self) -> RuleCategory {
        RuleCategory::Cqm
    }

    fn measurement_period(&self, context: &EvaluationContext) -> MeasurementPeriod {
        context.trailing_year()
    }

    fn applies_exclusions(&self) -> bool {
        true
    }
}
