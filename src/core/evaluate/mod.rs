//! Rule evaluation
//!
//! An evaluator runs one rule against one [`PatientBatch`] and returns a
//! [`RuleTally`]. Tallies from successive batches of the same scope are
//! merged and only turned into [`MeasureRow`]s once the scope is complete,
//! so rates are always computed over the whole provider population.
//!
//! Evaluators are selected by [`RuleCategory`] through an
//! [`EvaluatorRegistry`]; categories without an evaluator are not reportable.

pub mod amc;
pub mod cqm;
pub mod criteria;

pub use amc::AmcEvaluator;
pub use cqm::CqmEvaluator;

use crate::domain::{
    MeasureRow, PatientBatch, PatientRecord, Rate, RowOrigin, RuleCategory, RuleDefinition,
};
use chrono::{Months, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Inputs shared by every evaluation of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Report target date (end of the measurement period)
    pub target: NaiveDateTime,

    /// Explicit begin date for AMC reporting
    pub amc_begin: Option<NaiveDate>,
}

impl EvaluationContext {
    pub fn new(target: NaiveDateTime) -> Self {
        Self {
            target,
            amc_begin: None,
        }
    }

    pub fn with_amc_begin(mut self, begin: Option<NaiveDate>) -> Self {
        self.amc_begin = begin;
        self
    }

    /// The twelve months ending on the target date
    pub fn trailing_year(&self) -> MeasurementPeriod {
        let end = self.target.date();
        let begin = end.checked_sub_months(Months::new(12)).unwrap_or(end);
        MeasurementPeriod { begin, end }
    }
}

/// Inclusive date range criteria are evaluated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementPeriod {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

/// Counts of one population of a rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTally {
    pub total: u64,
    pub eligible: u64,
    pub excluded: u64,
    /// One count per numerator, in definition order
    pub numerators: Vec<u64>,
}

/// Counts of one rule over one or more batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTally {
    pub populations: Vec<PopulationTally>,
    /// One count per action, in definition order
    pub actions: Vec<u64>,
}

impl RuleTally {
    /// Zero counts shaped after the rule's populations and actions
    pub fn empty(rule: &RuleDefinition) -> Self {
        Self {
            populations: rule
                .populations
                .iter()
                .map(|p| PopulationTally {
                    numerators: vec![0; p.numerators.len()],
                    ..PopulationTally::default()
                })
                .collect(),
            actions: vec![0; rule.actions.len()],
        }
    }

    /// Adds another tally of the same rule into this one
    pub fn merge(&mut self, other: &RuleTally) {
        for (mine, theirs) in self.populations.iter_mut().zip(&other.populations) {
            mine.total += theirs.total;
            mine.eligible += theirs.eligible;
            mine.excluded += theirs.excluded;
            for (a, b) in mine.numerators.iter_mut().zip(&theirs.numerators) {
                *a += b;
            }
        }
        for (a, b) in self.actions.iter_mut().zip(&other.actions) {
            *a += b;
        }
    }

    /// Turns the final counts into rows
    ///
    /// One `main` row per population/numerator pair, followed by one `sub`
    /// row per action. Action rows share the first population's denominator.
    pub fn into_rows(self, rule: &RuleDefinition) -> Vec<MeasureRow> {
        let mut rows = Vec::new();

        for (population, tally) in rule.populations.iter().zip(&self.populations) {
            for (numerator, passed) in population.numerators.iter().zip(&tally.numerators) {
                rows.push(
                    MeasureRow {
                        origin: RowOrigin::Main,
                        rule_id: rule.id.clone(),
                        category: rule.category,
                        title: rule.title.clone(),
                        codes: rule.codes.clone(),
                        population_label: population.label.clone(),
                        numerator_label: numerator.label.clone(),
                        action: None,
                        total_patients: tally.total,
                        pass_filter: tally.eligible,
                        excluded: tally.excluded,
                        pass_target: *passed,
                        performance_rate: Rate::NotApplicable,
                        reporting_rate: Rate::NotApplicable,
                    }
                    .with_rates(),
                );
            }
        }

        let base = self.populations.first().cloned().unwrap_or_default();
        for (action, passed) in rule.actions.iter().zip(&self.actions) {
            rows.push(
                MeasureRow {
                    origin: RowOrigin::Sub,
                    rule_id: rule.id.clone(),
                    category: rule.category,
                    title: rule.title.clone(),
                    codes: rule.codes.clone(),
                    population_label: String::new(),
                    numerator_label: String::new(),
                    action: Some(action.label()),
                    total_patients: base.total,
                    pass_filter: base.eligible,
                    excluded: base.excluded,
                    pass_target: *passed,
                    performance_rate: Rate::NotApplicable,
                    reporting_rate: Rate::NotApplicable,
                }
                .with_rates(),
            );
        }

        rows
    }
}

/// Evaluates rules of one category
///
/// Implementations choose the measurement period and whether exclusions
/// apply; the counting itself is shared.
pub trait MeasureEvaluator: Send + Sync {
    /// Category of rules this evaluator handles
    fn category(&self) -> RuleCategory;

    /// Period the rule's criteria are evaluated in
    fn measurement_period(&self, context: &EvaluationContext) -> MeasurementPeriod;

    /// Whether denominator exclusions are applied
    fn applies_exclusions(&self) -> bool;

    /// Evaluates a rule against one batch of patients
    fn evaluate(
        &self,
        rule: &RuleDefinition,
        batch: &PatientBatch,
        context: &EvaluationContext,
    ) -> RuleTally {
        let period = self.measurement_period(context);
        let mut tally = RuleTally::empty(rule);
        for patient in batch.iter() {
            tally_patient(rule, patient, &period, self.applies_exclusions(), &mut tally);
        }
        tally
    }
}

/// Counts one patient into a tally
///
/// Order of checks per population: initial population, denominator,
/// exclusion, then numerators. Excluded patients never reach the numerators.
fn tally_patient(
    rule: &RuleDefinition,
    patient: &PatientRecord,
    period: &MeasurementPeriod,
    apply_exclusions: bool,
    tally: &mut RuleTally,
) {
    for (index, (population, counts)) in rule
        .populations
        .iter()
        .zip(tally.populations.iter_mut())
        .enumerate()
    {
        if !criteria::matches(&population.initial, patient, period) {
            continue;
        }
        counts.total += 1;

        if !criteria::matches(&population.denominator, patient, period) {
            continue;
        }
        counts.eligible += 1;

        let excluded = apply_exclusions
            && population
                .exclusion
                .as_ref()
                .is_some_and(|exclusion| criteria::matches(exclusion, patient, period));
        if excluded {
            counts.excluded += 1;
            continue;
        }

        for (numerator, passed) in population.numerators.iter().zip(counts.numerators.iter_mut()) {
            if criteria::matches(&numerator.criterion, patient, period) {
                *passed += 1;
            }
        }

        if index == 0 {
            for (action, passed) in rule.actions.iter().zip(tally.actions.iter_mut()) {
                if criteria::matches(&action.criterion, patient, period) {
                    *passed += 1;
                }
            }
        }
    }
}

/// Evaluators keyed by rule category
pub struct EvaluatorRegistry {
    evaluators: HashMap<RuleCategory, Box<dyn MeasureEvaluator>>,
}

impl EvaluatorRegistry {
    /// An empty registry; every category is unsupported
    pub fn empty() -> Self {
        Self {
            evaluators: HashMap::new(),
        }
    }

    /// CQM and AMC evaluators
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CqmEvaluator));
        registry.register(Box::new(AmcEvaluator));
        registry
    }

    /// Registers an evaluator, replacing any previous one for its category
    pub fn register(&mut self, evaluator: Box<dyn MeasureEvaluator>) {
        self.evaluators.insert(evaluator.category(), evaluator);
    }

    pub fn get(&self, category: RuleCategory) -> Option<&dyn MeasureEvaluator> {
        self.evaluators.get(&category).map(|e| e.as_ref())
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Criterion, MeasureCodes, Numerator, Population, RuleAction, RuleId};

    fn rule() -> RuleDefinition {
        RuleDefinition {
            id: RuleId::new("rule_test").unwrap(),
            category: RuleCategory::Cqm,
            title: "Test".to_string(),
            codes: MeasureCodes::default(),
            populations: vec![Population {
                label: "Population Criteria 1".to_string(),
                initial: Criterion::Always,
                denominator: Criterion::Always,
                exclusion: None,
                numerators: vec![
                    Numerator {
                        label: "Numerator 1".to_string(),
                        criterion: Criterion::Always,
                    },
                    Numerator {
                        label: "Numerator 2".to_string(),
                        criterion: Criterion::Always,
                    },
                ],
            }],
            actions: vec![RuleAction {
                category: "Intervention".to_string(),
                item: "Counseling".to_string(),
                criterion: Criterion::Always,
            }],
        }
    }

    #[test]
    fn test_trailing_year() {
        let context = EvaluationContext::new(
            NaiveDate::from_ymd_opt(2016, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        let period = context.trailing_year();
        assert_eq!(period.begin, NaiveDate::from_ymd_opt(2015, 6, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2016, 6, 1).unwrap());
    }

    #[test]
    fn test_tally_merge() {
        let rule = rule();
        let mut a = RuleTally::empty(&rule);
        a.populations[0].total = 2;
        a.populations[0].eligible = 2;
        a.populations[0].numerators = vec![1, 2];
        a.actions = vec![1];

        let mut b = RuleTally::empty(&rule);
        b.populations[0].total = 3;
        b.populations[0].eligible = 1;
        b.populations[0].excluded = 1;
        b.populations[0].numerators = vec![0, 0];

        a.merge(&b);
        assert_eq!(a.populations[0].total, 5);
        assert_eq!(a.populations[0].eligible, 3);
        assert_eq!(a.populations[0].excluded, 1);
        assert_eq!(a.populations[0].numerators, vec![1, 2]);
        assert_eq!(a.actions, vec![1]);
    }

    #[test]
    fn test_into_rows_main_then_sub() {
        let rule = rule();
        let mut tally = RuleTally::empty(&rule);
        tally.populations[0].eligible = 4;
        tally.populations[0].numerators = vec![2, 4];
        tally.actions = vec![1];

        let rows = tally.into_rows(&rule);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].origin, RowOrigin::Main);
        assert_eq!(rows[0].numerator_label, "Numerator 1");
        assert_eq!(rows[0].performance_rate, Rate::Percent(50.0));
        assert_eq!(rows[1].performance_rate, Rate::Percent(100.0));
        assert_eq!(rows[2].origin, RowOrigin::Sub);
        assert_eq!(rows[2].action.as_deref(), Some("Intervention: Counseling"));
        assert_eq!(rows[2].pass_filter, 4);
        assert_eq!(rows[2].pass_target, 1);
    }

    #[test]
    fn test_registry_standard_categories() {
        let registry = EvaluatorRegistry::standard();
        assert!(registry.get(RuleCategory::Cqm).is_some());
        assert!(registry.get(RuleCategory::Amc).is_some());
        assert!(registry.get(RuleCategory::Standard).is_none());
        assert!(EvaluatorRegistry::empty().get(RuleCategory::Cqm).is_none());
    }
}
