//! Report aggregation
//!
//! The aggregator consumes a collated stream and yields [`ResultRow`]s. Each
//! provider scope accumulates one [`RuleTally`] per rule across its batches;
//! the tallies become measure rows when the scope ends, that is on the next
//! provider or plan marker, or at the end of the stream.
//!
//! Rules that cannot be evaluated (unknown id, no evaluator for the
//! category) are skipped for the whole report and recorded in
//! [`AggregationStats::skipped_rules`].

use crate::core::catalog::RuleCatalog;
use crate::core::collate::CollatedItem;
use crate::core::evaluate::{EvaluationContext, EvaluatorRegistry, MeasureEvaluator, RuleTally};
use crate::domain::{
    PatientBatch, Result, ResultRow, RuleDefinition, RuleId, TallyError,
};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// A rule left out of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: String,
}

/// Counters collected while aggregating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationStats {
    pub plans: usize,
    pub providers: usize,
    pub batches: usize,
    /// Patient records evaluated; in inner mode a patient counts once per plan
    pub patients: usize,
    pub measure_rows: usize,
    pub skipped_rules: Vec<SkippedRule>,
}

/// A rule being tallied in the current provider scope
struct ScopedRule<'a> {
    rule: &'a RuleDefinition,
    evaluator: &'a dyn MeasureEvaluator,
    tally: RuleTally,
}

/// Lazy iterator of result rows
pub struct Aggregation<'a, I> {
    catalog: &'a RuleCatalog,
    evaluators: &'a EvaluatorRegistry,
    context: EvaluationContext,
    items: I,
    pending: VecDeque<ResultRow>,
    scope: Option<Vec<ScopedRule<'a>>>,
    skipped: HashSet<RuleId>,
    stats: AggregationStats,
    done: bool,
}

impl<'a, I> Aggregation<'a, I>
where
    I: Iterator<Item = Result<CollatedItem>>,
{
    /// Counters so far; complete once the iterator is exhausted
    pub fn stats(&self) -> &AggregationStats {
        &self.stats
    }

    pub fn into_stats(self) -> AggregationStats {
        self.stats
    }

    /// Resolves a rule and its evaluator
    ///
    /// Rule-scoped failures are logged and recorded once per report.
    fn resolve(&mut self, rule_id: &RuleId) -> Result<Option<ScopedRule<'a>>> {
        if self.skipped.contains(rule_id) {
            return Ok(None);
        }

        let catalog = self.catalog;
        let evaluators = self.evaluators;
        let resolved = catalog.lookup(rule_id).and_then(|rule| {
            evaluators
                .get(rule.category)
                .map(|evaluator| (rule, evaluator))
                .ok_or_else(|| TallyError::UnsupportedRuleType {
                    rule_id: rule_id.to_string(),
                    category: rule.category.to_string(),
                })
        });

        match resolved {
            Ok((rule, evaluator)) => Ok(Some(ScopedRule {
                rule,
                evaluator,
                tally: RuleTally::empty(rule),
            })),
            Err(e) if e.is_rule_scoped() => {
                crate::log_rule_skipped!(rule_id, &e);
                self.skipped.insert(rule_id.clone());
                self.stats.skipped_rules.push(SkippedRule {
                    rule_id: rule_id.to_string(),
                    reason: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Turns the tallies of the closing provider scope into rows
    fn flush(&mut self) {
        let Some(rules) = self.scope.take() else {
            return;
        };
        for scoped in rules {
            let rows = scoped.tally.into_rows(scoped.rule);
            self.stats.measure_rows += rows.len();
            self.pending.extend(rows.into_iter().map(ResultRow::Measure));
        }
    }

    fn evaluate(&mut self, batch: &PatientBatch) -> Result<()> {
        let rules = self.scope.as_mut().ok_or_else(|| {
            TallyError::MalformedScope("patient batch outside a provider scope".to_string())
        })?;

        self.stats.batches += 1;
        self.stats.patients += batch.len();

        for scoped in rules.iter_mut() {
            let tally = scoped.evaluator.evaluate(scoped.rule, batch, &self.context);
            scoped.tally.merge(&tally);
        }
        Ok(())
    }

    fn handle(&mut self, item: CollatedItem) -> Result<()> {
        match item {
            CollatedItem::Plan(plan) => {
                self.flush();
                self.stats.plans += 1;
                tracing::debug!(plan = %plan.plan_id, measure_group = %plan.measure_group, "Plan scope");
                self.pending.push_back(ResultRow::Plan(plan));
            }
            CollatedItem::Provider { row, rules } => {
                self.flush();
                self.stats.providers += 1;

                let mut scoped = Vec::with_capacity(rules.len());
                for rule_id in rules.iter() {
                    if let Some(rule) = self.resolve(rule_id)? {
                        scoped.push(rule);
                    }
                }
                tracing::debug!(
                    provider = %row.provider.id,
                    rules = scoped.len(),
                    "Provider scope"
                );
                self.scope = Some(scoped);
                self.pending.push_back(ResultRow::Provider(row));
            }
            CollatedItem::Batch(batch) => {
                crate::log_batch_evaluated!(self.stats.batches + 1, batch.len());
                self.evaluate(&batch)?;
            }
        }
        Ok(())
    }
}

impl<'a, I> Iterator for Aggregation<'a, I>
where
    I: Iterator<Item = Result<CollatedItem>>,
{
    type Item = Result<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }

            match self.items.next() {
                Some(Ok(item)) => {
                    if let Err(e) = self.handle(item) {
                        self.done = true;
                        self.pending.clear();
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    self.pending.clear();
                    return Some(Err(e));
                }
                None => {
                    self.flush();
                    self.done = true;
                }
            }
        }
    }
}

/// Aggregates a collated stream into result rows
pub fn aggregate<'a, I>(
    catalog: &'a RuleCatalog,
    evaluators: &'a EvaluatorRegistry,
    context: EvaluationContext,
    items: I,
) -> Aggregation<'a, I::IntoIter>
where
    I: IntoIterator<Item = Result<CollatedItem>>,
{
    Aggregation {
        catalog,
        evaluators,
        context,
        items: items.into_iter(),
        pending: VecDeque::new(),
        scope: None,
        skipped: HashSet::new(),
        stats: AggregationStats::default(),
        done: false,
    }
}
